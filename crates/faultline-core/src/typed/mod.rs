//! Typed - 型付き union と型のない失敗の境界
//!
//! このモジュールは tag 文字列しか持たない失敗を、宣言された union に
//! 変換します。宣言されていない tag は defect として扱います。
//!
//! # 二層構造
//! - **表層（Typed）**: `Failures![...]` - 宣言された union
//! - **境界（Dyn）**: `DynFailure` - tag + JSON payload

pub mod codec;
pub mod registry;

// 主要な trait/型 を再エクスポート
pub use self::codec::{DecodeFailure, DynFailure, EncodeFailure};
pub use self::registry::{RegistryError, TagRegistry};
