//! Shared tree example: one writer thread, one prover thread
//!
//! Run with:
//! ```bash
//! RUST_LOG=imt=debug IMT_DEPTH=4 cargo run --example shared-tree
//! ```

use std::{sync::mpsc, thread};

use tracing::info;
use tracing_subscriber::EnvFilter;
use xlayer_imt::{
    IncrementalMerkleTree, InclusionVerifier, Keccak256Hasher, SharedTree, TreeConfig,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = TreeConfig::from_env();
    let tree = SharedTree::new(IncrementalMerkleTree::from_config(&config)?);
    info!(depth = config.depth, root = %tree.root(), "Tree ready");

    let (tx, rx) = mpsc::channel::<u64>();

    // The writer owns insertion order; it announces each new index.
    let writer = {
        let tree = tree.clone();
        thread::spawn(move || -> anyhow::Result<()> {
            for i in 0..8u64 {
                let leaf = Keccak256Hasher::hash(format!("payload-{i}").as_bytes());
                let proof = tree.insert_with_proof(leaf)?;
                tx.send(proof.index)?;
            }
            Ok(())
        })
    };

    let verifier = InclusionVerifier::new(config.depth);
    for index in rx {
        let bundle = tree.inclusion_proof(index)?;
        let valid = bundle.verify(&verifier)?;
        info!(index, root = %bundle.root, valid, "Proof checked");
        println!("{}", serde_json::to_string(&bundle)?);
    }

    writer.join().map_err(|_| anyhow::anyhow!("writer thread panicked"))??;
    info!(leaves = tree.len(), root = %tree.root(), "Done");
    Ok(())
}
