//! ViT + GPT-2 キャプション生成（ONNX）
//!
//! - encoder_model.onnx: pixel_values → last_hidden_state
//! - decoder_model.onnx: (input_ids, encoder_hidden_states) → logits
//!
//! KVキャッシュなしのデコーダを想定し、毎ステップ接頭辞全体を入力する。

use super::beam::{beam_search, BeamConfig};
use super::gpt2::Gpt2Decoder;
use super::preprocess::vit_pixel_values;
use super::{inference_err, open_session, Captioner, SessionOptions, SessionPool};
use crate::error::{AnalyzerError, Result};
use image::RgbImage;
use ndarray::{Array2, ArrayD};
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const ENCODER_FILE: &str = "encoder_model.onnx";
const DECODER_FILE: &str = "decoder_model.onnx";
const VOCAB_FILE: &str = "vocab.json";
const CONFIG_FILE: &str = "config.json";

/// GPT-2 の `<|endoftext|>`
const GPT2_EOS: i64 = 50256;

#[derive(Debug, Default, Deserialize)]
struct DecoderTokens {
    bos_token_id: Option<i64>,
    eos_token_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct CaptionModelConfig {
    decoder_start_token_id: Option<i64>,
    eos_token_id: Option<i64>,
    pad_token_id: Option<i64>,
    #[serde(default)]
    decoder: DecoderTokens,
}

/// 特殊トークンid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub start: i64,
    pub eos: i64,
    pub pad: i64,
}

impl SpecialTokens {
    pub fn from_config_json(content: &str) -> Result<Self> {
        let config: CaptionModelConfig = serde_json::from_str(content)?;
        let start = config
            .decoder_start_token_id
            .or(config.decoder.bos_token_id)
            .unwrap_or(GPT2_EOS);
        let eos = config
            .eos_token_id
            .or(config.decoder.eos_token_id)
            .unwrap_or(GPT2_EOS);
        Ok(Self {
            start,
            eos,
            pad: config.pad_token_id.unwrap_or(eos),
        })
    }
}

pub struct OnnxCaptioner {
    encoders: SessionPool<Session>,
    decoders: SessionPool<Session>,
    tokenizer: Gpt2Decoder,
    beam: BeamConfig,
}

impl OnnxCaptioner {
    pub fn load(
        dir: &Path,
        options: SessionOptions,
        num_beams: usize,
        max_length: usize,
    ) -> Result<Self> {
        let (encoder, decoder) = (dir.join(ENCODER_FILE), dir.join(DECODER_FILE));
        let encoders = SessionPool::build(options.copies, || {
            open_session(&encoder, options.intra_threads)
        })?;
        let decoders = SessionPool::build(options.copies, || {
            open_session(&decoder, options.intra_threads)
        })?;

        let tokens = SpecialTokens::from_config_json(&std::fs::read_to_string(dir.join(CONFIG_FILE))?)?;
        let tokenizer = Gpt2Decoder::from_vocab_file(
            &dir.join(VOCAB_FILE),
            vec![tokens.start, tokens.eos, tokens.pad],
        )?;
        debug!(
            "キャプションモデル読み込み: {} (語彙{}, beams={}, max_length={})",
            dir.display(),
            tokenizer.vocab_size(),
            num_beams,
            max_length
        );

        Ok(Self {
            encoders,
            decoders,
            tokenizer,
            beam: BeamConfig {
                num_beams,
                max_length,
                start_token: tokens.start,
                eos_token: tokens.eos,
            },
        })
    }

    fn encode(&self, image: &RgbImage) -> Result<ArrayD<f32>> {
        let input = Tensor::from_array(vit_pixel_values(image)).map_err(inference_err)?;

        let mut encoder = self.encoders.lock()?;
        let outputs = encoder
            .run(ort::inputs!["pixel_values" => input])
            .map_err(inference_err)?;
        let hidden = outputs[0].try_extract_array::<f32>().map_err(inference_err)?;
        Ok(hidden.to_owned())
    }
}

impl Captioner for OnnxCaptioner {
    fn caption(&self, image: &RgbImage) -> Result<String> {
        let hidden = self.encode(image)?;

        // ビームサーチ中は同じワーカー用のデコーダを使い続ける
        let mut decoder = self.decoders.lock()?;
        let tokens = beam_search(&self.beam, |prefix| {
            let ids = Array2::from_shape_vec((1, prefix.len()), prefix.to_vec())
                .map_err(inference_err)?;
            let ids = Tensor::from_array(ids).map_err(inference_err)?;
            let states = Tensor::from_array(hidden.clone()).map_err(inference_err)?;

            let outputs = decoder
                .run(ort::inputs![
                    "input_ids" => ids,
                    "encoder_hidden_states" => states
                ])
                .map_err(inference_err)?;
            let logits = outputs[0].try_extract_array::<f32>().map_err(inference_err)?;

            // [1, seq, vocab] の最終位置
            let shape = logits.shape().to_vec();
            if shape.len() != 3 || shape[1] == 0 {
                return Err(AnalyzerError::Inference(format!(
                    "unexpected logits shape: {:?}",
                    shape
                )));
            }
            let (seq, vocab) = (shape[1], shape[2]);
            let last: Vec<f32> = logits.iter().skip((seq - 1) * vocab).take(vocab).copied().collect();
            Ok(last)
        })?;

        Ok(self.tokenizer.decode(&tokens))
    }
}
