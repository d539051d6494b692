//! CRD YAML Generator
//!
//! Prints the NetworkFilesystem CRD manifest.
//!
//! Usage: cargo run --bin crdgen > deploy/crds/networkfilesystem.yaml

use networkfs_endpoint_controller::crd::generate_crds;

fn main() -> anyhow::Result<()> {
    for crd in generate_crds()? {
        println!("---");
        print!("{}", crd);
    }
    Ok(())
}
