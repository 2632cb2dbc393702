pub mod grouping;
pub mod resources;
pub mod schemas;
pub mod types;

pub use resources::*;
pub use schemas::*;
pub use types::{
    ApiKeyLocation, IrInfo, IrSecurityScheme, IrSpec, IrWarning, MethodRef, NormalizedName,
    SecurityKind,
};
