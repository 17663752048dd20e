//! # CRD Generator
//!
//! Prints the CustomResourceDefinitions for `ApiEndpoints` and `Krakend`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/crds.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use krakend_endpoints_controller::crd::{ApiEndpoints, Krakend};

fn main() {
    let crds = [ApiEndpoints::crd(), Krakend::crd()];

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    for crd in &crds {
        match serde_yaml::to_string(crd) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}
