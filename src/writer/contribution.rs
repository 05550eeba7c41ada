//! Hand the bundle contribution to the host bundler as JSON.

use std::io::{self, Write};

use crate::processor::driver::BundleContribution;

pub fn emit(contribution: &BundleContribution, out: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, contribution)?;
    writeln!(out)
}
