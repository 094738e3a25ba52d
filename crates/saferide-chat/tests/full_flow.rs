use std::fs;
use std::path::Path;

use tempfile::TempDir;

use saferide_chat::{ChatPipeline, Outcome};
use saferide_core::config::Settings;

fn write_artifacts(dir: &Path) {
    fs::write(
        dir.join("vocabulary.json"),
        r#"{"oov_token": "<OOV>", "word_index": {"<OOV>": 1, "hola": 2, "viaje": 3, "seguro": 4}}"#,
    )
    .unwrap();
    fs::write(
        dir.join("response_map.json"),
        r#"{"¡Hola! ¿En qué te ayudo?": 0, "Todos los viajes son monitoreados.": 1}"#,
    )
    .unwrap();
    fs::write(
        dir.join("data.json"),
        r#"{"conversations": [
            {"prompt": "hola", "completion": "¡Hola! ¿En qué te ayudo?", "intent": "saludo"},
            {"prompt": "es seguro", "completion": "Todos los viajes son monitoreados.", "intent": "seguridad", "examples": []}
        ]}"#,
    )
    .unwrap();
}

fn settings_for(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.artifacts.dir = dir.display().to_string();
    settings.lemmatizer.language = "none".to_string();
    settings
}

#[test]
fn pipeline_loads_from_artifact_directory() {
    std::env::set_var("APP_USE_FAKE_SCORER", "1");
    let tmp = TempDir::new().unwrap();
    write_artifacts(tmp.path());

    let pipeline = ChatPipeline::from_settings(&settings_for(tmp.path())).expect("pipeline");
    assert_eq!(pipeline.resolver().classes().len(), 2);
    assert!(pipeline.resolver().unmatched_classes().is_empty());

    assert_eq!(pipeline.reply("5 * 6").unwrap().text, "El resultado de 5 * 6 es 30");

    let answer = pipeline.reply("Hola, viaje seguro").unwrap();
    assert!(matches!(answer.outcome, Outcome::Answered { enriched: false, .. }));
    assert!(pipeline.resolver().classes().index_of(&answer.text).is_some(), "always a canned answer");
    assert_eq!(pipeline.reply("Hola, viaje seguro").unwrap(), answer, "same input, same answer");

    assert_eq!(pipeline.reply("xyz abc").unwrap().outcome.label(), "low_confidence");
}

#[test]
fn missing_artifact_prevents_startup() {
    std::env::set_var("APP_USE_FAKE_SCORER", "1");
    let tmp = TempDir::new().unwrap();
    write_artifacts(tmp.path());
    fs::remove_file(tmp.path().join("data.json")).unwrap();
    assert!(ChatPipeline::from_settings(&settings_for(tmp.path())).is_err());

    write_artifacts(tmp.path());
    fs::write(tmp.path().join("response_map.json"), r#"{"a": 0, "b": 2}"#).unwrap();
    assert!(ChatPipeline::from_settings(&settings_for(tmp.path())).is_err(), "class indices must be contiguous");
}
