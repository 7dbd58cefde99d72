//! GPT-2 バイトレベルBPEのデコード
//!
//! 生成には語彙の逆引きとバイト復元だけが必要なので、エンコーダは持たない。

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;

pub struct Gpt2Decoder {
    /// id → トークン文字列
    vocab: Vec<Option<String>>,
    byte_decoder: HashMap<char, u8>,
    special_tokens: Vec<i64>,
}

impl Gpt2Decoder {
    /// `vocab.json`（トークン → id）から構築
    pub fn from_vocab_file(path: &Path, special_tokens: Vec<i64>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let vocab: HashMap<String, u32> = serde_json::from_str(&content)?;
        Ok(Self::from_vocab(vocab, special_tokens))
    }

    pub fn from_vocab(vocab: HashMap<String, u32>, special_tokens: Vec<i64>) -> Self {
        let size = vocab.values().max().map_or(0, |&m| m as usize + 1);
        let mut by_id = vec![None; size];
        for (token, id) in vocab {
            by_id[id as usize] = Some(token);
        }

        Self {
            vocab: by_id,
            byte_decoder: bytes_to_unicode().into_iter().map(|(b, c)| (c, b)).collect(),
            special_tokens,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// トークン列を文字列へ。特殊トークンと範囲外のidは無視する
    pub fn decode(&self, ids: &[i64]) -> String {
        let mut bytes = Vec::new();

        for &id in ids {
            if self.special_tokens.contains(&id) || id < 0 {
                continue;
            }
            let Some(Some(token)) = self.vocab.get(id as usize) else {
                continue;
            };
            bytes.extend(token.chars().filter_map(|c| self.byte_decoder.get(&c).copied()));
        }

        String::from_utf8_lossy(&bytes).trim().to_string()
    }
}

/// GPT-2 のバイト → 可視文字対応表
///
/// 表示可能なバイトはそのまま、それ以外は U+0100 以降へ順に割り当てる。
fn bytes_to_unicode() -> Vec<(u8, char)> {
    let mut bytes: Vec<u32> = (u32::from('!')..=u32::from('~'))
        .chain(0xA1..=0xAC)
        .chain(0xAE..=0xFF)
        .collect();
    let mut chars = bytes.clone();

    let mut n = 0;
    for b in 0..256u32 {
        if !bytes.contains(&b) {
            bytes.push(b);
            chars.push(256 + n);
            n += 1;
        }
    }

    bytes
        .into_iter()
        .zip(chars)
        .filter_map(|(b, c)| Some((u8::try_from(b).ok()?, char::from_u32(c)?)))
        .collect()
}
