//! Domain model: results, failure unions, tags and defects.

pub mod defect;
pub mod result;
pub mod tag;
pub mod union;

pub use self::defect::Defect;
pub use self::result::{TypedResult, fail, fail_with, succeed};
pub use self::tag::{Tagged, tag_of};
pub use self::union::{Append, Embed, FailureSet, Here, Inject, Nil, Or, Pluck, There};
