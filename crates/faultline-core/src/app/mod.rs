//! App - 実行層
//!
//! domain の型を組み合わせて、step の連鎖を組み立てて実行します。
//!
//! # 主要コンポーネント
//! - **Effect**: step の連鎖（遅延評価、1 回だけ実行）
//! - **Interpreter**: ステージ列を順番に実行するループ
//! - **Recovery**: tag による選択的な回復と defect の観測
//! - **RunConfig**: 実行時の設定

pub mod config;
pub mod effect;
pub(crate) mod interpreter;
pub mod recovery;

// 主要な型を再エクスポート
pub use self::config::RunConfig;
pub use self::effect::Effect;
pub use self::interpreter::{Exit, settle};
