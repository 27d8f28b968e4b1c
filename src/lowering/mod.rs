pub mod c;

pub use c::{generate_c, CArtifacts};
