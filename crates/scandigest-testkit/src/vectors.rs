//! Golden digest vectors.
//!
//! A bucket digest is the hex hash of its version tokens concatenated in
//! arrival order with no separator. These vectors pin that encoding so any
//! participant can check it produces byte-identical digests.

use scandigest_core::{DigestAlgorithm, DigestBuilder, ScanResultEntry};

pub const MD5_EMPTY: &str = "d41d8cd98f00b204e9800998ecf8427e";
pub const MD5_VSN1_VSN4: &str = "41c4be4aae2f76c3b47c524551185451";
pub const MD5_VSN2: &str = "8b5452fe0b023c8644913c1ebaccf310";
pub const MD5_VSN3: &str = "61a4baa903997e9d7119df2d4df9e436";

/// A golden digest vector.
#[derive(Debug, Clone)]
pub struct DigestVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub algorithm: DigestAlgorithm,
    /// Version tokens in arrival order.
    pub versions: &'static [&'static str],
    /// Expected hex digest.
    pub expected: &'static str,
}

/// Get all golden digest vectors.
pub fn all_vectors() -> Vec<DigestVector> {
    vec![
        DigestVector {
            name: "md5 single token",
            algorithm: DigestAlgorithm::Md5,
            versions: &["abc"],
            expected: "900150983cd24fb0d6963f7d28e17f72",
        },
        DigestVector {
            name: "md5 split token",
            algorithm: DigestAlgorithm::Md5,
            versions: &["a", "bc"],
            expected: "900150983cd24fb0d6963f7d28e17f72",
        },
        DigestVector {
            name: "md5 vsn1 then vsn4",
            algorithm: DigestAlgorithm::Md5,
            versions: &["vsn1", "vsn4"],
            expected: MD5_VSN1_VSN4,
        },
        DigestVector {
            name: "md5 vsn2",
            algorithm: DigestAlgorithm::Md5,
            versions: &["vsn2"],
            expected: MD5_VSN2,
        },
        DigestVector {
            name: "md5 vsn3",
            algorithm: DigestAlgorithm::Md5,
            versions: &["vsn3"],
            expected: MD5_VSN3,
        },
        DigestVector {
            name: "md5 four tokens",
            algorithm: DigestAlgorithm::Md5,
            versions: &["vsn1", "vsn2", "vsn3", "vsn4"],
            expected: "4089efa39ff1f3722ab57b41c5dfa38e",
        },
        DigestVector {
            name: "blake3 single token",
            algorithm: DigestAlgorithm::Blake3,
            versions: &["abc"],
            expected: "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85",
        },
        DigestVector {
            name: "blake3 vsn1 then vsn4",
            algorithm: DigestAlgorithm::Blake3,
            versions: &["vsn1", "vsn4"],
            expected: "1670a482b6f8e4aa922bd4a20892e846c44c778d91550f92f131498947ae1161",
        },
        DigestVector {
            name: "blake3 vsn2",
            algorithm: DigestAlgorithm::Blake3,
            versions: &["vsn2"],
            expected: "cbeec73e9cf032a90054c23aab2744c773d1fd36c49314af6d3835d24a3e92be",
        },
    ]
}

/// Compute a vector's digest by feeding its versions through one bucket.
pub fn compute_digest(vector: &DigestVector) -> String {
    let Ok(builder) = DigestBuilder::new(Vec::new()) else {
        return String::new();
    };
    let mut builder = builder.algorithm(vector.algorithm);
    for (i, version) in vector.versions.iter().enumerate() {
        // zero-padded ids keep the scan ascending
        let entry = ScanResultEntry::for_entity(
            format!("id{i:04}"),
            *version,
            None,
            Default::default(),
        );
        if builder.add(&entry).is_err() {
            return String::new();
        }
    }
    builder
        .to_digests()
        .into_iter()
        .next()
        .map(|d| d.version)
        .unwrap_or_default()
}

/// Check one vector, reporting the mismatch.
pub fn verify_vector(vector: &DigestVector) -> Result<(), String> {
    let actual = compute_digest(vector);
    if actual == vector.expected {
        Ok(())
    } else {
        Err(format!(
            "{}: expected {}, got {}",
            vector.name, vector.expected, actual
        ))
    }
}

/// Check every vector, collecting all mismatches.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failures: Vec<String> = all_vectors()
        .iter()
        .filter_map(|v| verify_vector(v).err())
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}
