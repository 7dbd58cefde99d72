use crate::config::Config;
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "asset-analyzer")]
#[command(
    about = "Analyze images with local classification & captioning models, output JSON",
    long_about = None
)]
pub struct Cli {
    /// 解析対象のディレクトリ（再帰的にスキャン）
    #[arg(required = true)]
    pub directory: PathBuf,

    /// 出力JSONファイル（省略時は標準出力）
    #[arg(long, default_value = "")]
    pub output: String,

    /// 並列ワーカー数（デフォルト: 設定ファイルの値、未設定なら4）
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// モデルのルートディレクトリ
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// キャプション生成のビーム幅
    #[arg(long)]
    pub num_beams: Option<usize>,

    /// キャプションの最大トークン長
    #[arg(long)]
    pub max_caption_length: Option<usize>,

    /// 詳細ログを出力
    #[arg(short, long)]
    pub verbose: bool,

    /// 進捗バーを表示しない
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// 空文字の `--output` は標準出力扱い
    pub fn output_path(&self) -> Option<&Path> {
        if self.output.is_empty() {
            None
        } else {
            Some(Path::new(&self.output))
        }
    }

    /// コマンドライン指定で設定を上書き
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.model_dir {
            config.model_dir = dir.clone();
        }
        if let Some(workers) = self.max_workers {
            config.max_workers = workers;
        }
        if let Some(beams) = self.num_beams {
            config.num_beams = beams;
        }
        if let Some(length) = self.max_caption_length {
            config.max_caption_length = length;
        }
    }
}
