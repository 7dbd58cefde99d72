//! ビームサーチ
//!
//! モデル非依存。次トークンのロジットを返す関数を受け取り、
//! 長さ正規化したスコアが最大の系列を選ぶ。

use crate::error::Result;
use crate::models::ops::{log_softmax, top_k};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamConfig {
    pub num_beams: usize,
    /// 開始トークンを含む最大長
    pub max_length: usize,
    pub start_token: i64,
    pub eos_token: i64,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            num_beams: 4,
            max_length: 16,
            start_token: 50256,
            eos_token: 50256,
        }
    }
}

#[derive(Debug, Clone)]
struct Hypothesis {
    tokens: Vec<i64>,
    /// 探索中は対数確率の和、確定後は長さで割った値
    score: f32,
}

/// ビームサーチを実行し、開始トークンを除いた生成トークン列を返す
///
/// `next_logits` は接頭辞（開始トークンを含む）に対する次トークンのロジットを返す。
pub fn beam_search<F>(config: &BeamConfig, mut next_logits: F) -> Result<Vec<i64>>
where
    F: FnMut(&[i64]) -> Result<Vec<f32>>,
{
    let k = config.num_beams.max(1);
    let mut beams = vec![Hypothesis {
        tokens: vec![config.start_token],
        score: 0.0,
    }];
    let mut finished: Vec<Hypothesis> = Vec::new();

    while beams.first().map_or(false, |b| b.tokens.len() < config.max_length) {
        let mut candidates: Vec<(usize, i64, f32)> = Vec::new();
        for (i, beam) in beams.iter().enumerate() {
            let log_probs = log_softmax(&next_logits(&beam.tokens)?);
            for (token, lp) in top_k(&log_probs, 2 * k) {
                candidates.push((i, token as i64, beam.score + lp));
            }
        }
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut next = Vec::with_capacity(k);
        for (rank, (i, token, score)) in candidates.into_iter().enumerate() {
            if token == config.eos_token {
                // 上位k件に入ったEOSのみ確定させる
                if rank < k {
                    add_finished(&mut finished, beams[i].tokens.clone(), score, k);
                }
                continue;
            }

            let mut tokens = beams[i].tokens.clone();
            tokens.push(token);
            next.push(Hypothesis { tokens, score });
            if next.len() == k {
                break;
            }
        }
        beams = next;

        if finished.len() >= k {
            let worst = finished
                .iter()
                .map(|h| h.score)
                .fold(f32::INFINITY, f32::min);
            let best_running = beams
                .first()
                .map(|b| b.score / b.tokens.len() as f32)
                .unwrap_or(f32::NEG_INFINITY);
            if best_running <= worst {
                break;
            }
        }
    }

    for beam in beams {
        add_finished(&mut finished, beam.tokens, beam.score, k);
    }

    let best = finished.into_iter().fold(None::<Hypothesis>, |best, h| match best {
        Some(b) if b.score >= h.score => Some(b),
        _ => Some(h),
    });

    Ok(best
        .map(|h| h.tokens.into_iter().skip(1).collect())
        .unwrap_or_default())
}

/// 確定済み仮説に追加し、k件を超えたら最下位を捨てる
fn add_finished(finished: &mut Vec<Hypothesis>, tokens: Vec<i64>, sum_log_prob: f32, k: usize) {
    let score = sum_log_prob / tokens.len().max(1) as f32;
    finished.push(Hypothesis { tokens, score });

    if finished.len() > k {
        if let Some(worst) = finished
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.score.total_cmp(&b.1.score))
            .map(|(i, _)| i)
        {
            finished.remove(worst);
        }
    }
}
