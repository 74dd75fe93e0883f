use proptest::prelude::*;
use dupesweep::duplicates::{bucket_candidates, partition_by_fingerprint, BucketKey, BucketMember, DuplicateFinder};
use dupesweep::scanner::{ContentDigest, FileCandidate, Fingerprint, Hasher, HasherConfig};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

proptest! {
    #[test]
    fn test_full_digest_matches_sha256(
        content in prop::collection::vec(any::<u8>(), 0..20_000),
        chunk in 1usize..10_000,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        fs::write(&path, &content).unwrap();

        let hasher = Hasher::with_config(HasherConfig::default().with_full_chunk_size(chunk));
        let digest = hasher.full_digest(&path).unwrap();
        let expected: [u8; 32] = Sha256::digest(&content).into();

        prop_assert_eq!(digest, ContentDigest(expected));
    }

    #[test]
    fn test_fingerprint_falls_back_below_threshold(
        content in prop::collection::vec(any::<u8>(), 0..8192),
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        fs::write(&path, &content).unwrap();

        let hasher = Hasher::new();
        let fingerprint = hasher.fingerprint(&path, content.len() as u64).unwrap();

        prop_assert_eq!(fingerprint, Fingerprint::Full(ContentDigest::of_bytes(&content)));
    }

    #[test]
    fn test_fingerprint_determinism(
        content in prop::collection::vec(any::<u8>(), 8192..30_000),
    ) {
        let dir = TempDir::new().unwrap();
        let path1 = dir.path().join("a.bin");
        let path2 = dir.path().join("b.bin");
        fs::write(&path1, &content).unwrap();
        fs::write(&path2, &content).unwrap();

        let hasher = Hasher::new();
        let size = content.len() as u64;
        let fp1 = hasher.fingerprint(&path1, size).unwrap();
        let fp2 = hasher.fingerprint(&path2, size).unwrap();

        prop_assert!(!fp1.is_full());
        prop_assert_eq!(fp1, fp2);
    }

    #[test]
    fn test_bucketing_invariants(
        files in prop::collection::vec((0u64..20, prop::sample::select(vec!["", ".a", ".b"])), 0..60),
    ) {
        let candidates: Vec<FileCandidate> = files
            .iter()
            .enumerate()
            .map(|(i, (size, ext))| FileCandidate::new(PathBuf::from(format!("/fake/{i}{ext}")), *size))
            .collect();

        let (sets, stats) = bucket_candidates(candidates.clone());

        prop_assert_eq!(stats.total_files, candidates.len());
        prop_assert_eq!(stats.potential_duplicates + stats.eliminated_unique, candidates.len());

        let mut seen = BTreeSet::new();
        for bucket in &sets {
            prop_assert!(bucket.len() >= 2);
            prop_assert!(seen.insert(bucket.key.clone()));
            for path in &bucket.paths {
                let candidate = candidates.iter().find(|c| &c.path == path).unwrap();
                prop_assert_eq!(candidate.size, bucket.key.size);
                prop_assert_eq!(&candidate.extension, &bucket.key.extension);
            }
        }
    }

    #[test]
    fn test_partition_covers_every_member_once(
        fingerprints in prop::collection::vec(0u8..4, 0..40),
    ) {
        let key = BucketKey::new(100, ".bin");
        let fingerprinted: Vec<(BucketMember, Fingerprint)> = fingerprints
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &fp)| (BucketMember::new(i, PathBuf::from(format!("/f{i}"))), Fingerprint::Partial([fp; 32])))
            .collect();

        let groups = partition_by_fingerprint(&key, fingerprinted);

        let total: usize = groups.iter().map(|g| g.members.len()).sum();
        prop_assert_eq!(total, fingerprints.len());

        let distinct: BTreeSet<u8> = fingerprints.iter().copied().collect();
        prop_assert_eq!(groups.len(), distinct.len());

        for group in &groups {
            prop_assert!(group.members.windows(2).all(|w| w[0].position < w[1].position));
        }
        prop_assert!(groups.windows(2).all(|w| w[0].members[0].position < w[1].members[0].position));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_scan_matches_naive_grouping(
        files in prop::collection::vec((0usize..4, prop::sample::select(vec!["txt", "dat"])), 0..20),
    ) {
        let bodies: [&[u8]; 4] = [b"", b"alpha", b"bravo", b"charlie-charlie"];
        let dir = TempDir::new().unwrap();
        let mut expected: BTreeMap<(usize, &str), BTreeSet<PathBuf>> = BTreeMap::new();

        for (i, (body, ext)) in files.iter().enumerate() {
            let path = dir.path().join(format!("f{i:02}.{ext}"));
            fs::write(&path, bodies[*body]).unwrap();
            expected.entry((*body, ext)).or_default().insert(path);
        }
        let expected: BTreeSet<BTreeSet<PathBuf>> = expected
            .into_values()
            .filter(|paths| paths.len() >= 2)
            .collect();

        let (groups, summary) = DuplicateFinder::with_defaults().find_duplicates(dir.path()).unwrap();
        let actual: BTreeSet<BTreeSet<PathBuf>> = groups
            .iter()
            .map(|g| g.files.iter().cloned().collect())
            .collect();

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(summary.duplicate_groups, groups.len());
        prop_assert!(summary.errors.is_empty());
    }
}
