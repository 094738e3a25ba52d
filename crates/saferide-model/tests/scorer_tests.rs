use std::collections::HashMap;

use candle_core::{Device, Tensor};
use saferide_core::error::Error;
use saferide_core::traits::IntentScorer;
use saferide_model::{get_default_scorer, BagOfEmbeddingsScorer, FakeScorer};

fn argmax(v: &[f32]) -> usize {
    v.iter().enumerate().fold(0, |best, (i, x)| if *x > v[best] { i } else { best })
}

/// V=4 tokens, D=2, N=2 classes: id 2 points at class 0, id 3 at class 1.
fn write_weights(dir: &std::path::Path) -> std::path::PathBuf {
    let dev = Device::Cpu;
    let mut tensors = HashMap::new();
    tensors.insert(
        "embedding.weight".to_string(),
        Tensor::from_slice(&[0f32, 0., 0., 0., 1., 0., 0., 1.], (4, 2), &dev).unwrap(),
    );
    tensors.insert("head.weight".to_string(), Tensor::from_slice(&[5f32, 0., 0., 5.], (2, 2), &dev).unwrap());
    tensors.insert("head.bias".to_string(), Tensor::from_slice(&[0f32, 0.], 2, &dev).unwrap());
    let path = dir.join("model.safetensors");
    candle_core::safetensors::save(&tensors, &path).unwrap();
    path
}

#[test]
fn bag_of_embeddings_scores_distribution() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_weights(tmp.path());
    let scorer = BagOfEmbeddingsScorer::load(&path, Device::Cpu).expect("load");
    assert_eq!(scorer.num_classes(), 2);
    assert_eq!(scorer.token_capacity(), Some(4));

    let p = scorer.score(&[2, 0, 0, 0]).expect("score");
    assert_eq!(p.len(), 2);
    assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    assert_eq!(argmax(&p), 0);

    let p = scorer.score(&[3, 3, 2, 0, 0]).expect("score");
    assert_eq!(argmax(&p), 1, "padding does not dilute the mean");

    let err = scorer.score(&[9, 0]).unwrap_err();
    assert!(matches!(err, Error::Scorer(_)));
}

#[test]
fn missing_weights_fail_to_load() {
    let tmp = tempfile::tempdir().unwrap();
    let err = BagOfEmbeddingsScorer::load(&tmp.path().join("none.safetensors"), Device::Cpu).err().expect("error");
    assert!(matches!(err, Error::Artifact { .. }));
}

#[test]
fn fake_scorer_is_deterministic() {
    std::env::set_var("APP_USE_FAKE_SCORER", "1");
    let scorer = get_default_scorer(std::path::Path::new("/nonexistent"), 5).expect("fake");
    assert_eq!(scorer.num_classes(), 5);
    let a = scorer.score(&[4, 9, 2, 0, 0]).expect("score");
    let b = scorer.score(&[4, 9, 2, 0, 0]).expect("score");
    assert_eq!(a, b);
    assert!((a.iter().sum::<f32>() - 1.0).abs() < 1e-4);

    let uniform = FakeScorer::new(4).score(&[0, 0, 0]).expect("score");
    assert_eq!(uniform, vec![0.25; 4]);
    assert!(FakeScorer::new(0).score(&[1]).is_err());
}
