//! gde output plugins
//!
//! | Plugin | Delivers to |
//! |--------|-------------|
//! | `file` | a directory tree per group, optionally zipped when the group finishes |
//! | `s3` | an S3 bucket, one archive or one object per document per group |
//! | `stdout` | one line per item on standard output |
//!
//! Call [`register`] once at startup to make them available to the agent.

pub mod file;
pub mod s3;
pub mod stdout;

use gde_core::Registry;

/// Register every output plugin in this crate
pub fn register(registry: &mut Registry) {
    registry.add_output(file::NAME, file::FileOutput::create);
    registry.add_output(s3::NAME, s3::S3Output::create);
    registry.add_output(stdout::NAME, stdout::StdoutOutput::create);
}
