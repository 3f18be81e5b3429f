//! Pipeline boundaries around the `trackdata` core.
//!
//! Decoding and serialization for both pipelines live here: FIT recordings
//! in, TCX documents in and out, CSV training data out, plus the vendor
//! download client. The binaries under `src/bin/` wire these together with
//! environment configuration.

pub mod client;
pub mod csv_out;
pub mod env;
pub mod fit;
pub mod tcx;
