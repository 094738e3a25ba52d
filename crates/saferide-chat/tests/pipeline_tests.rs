use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use saferide_chat::{handle, handle_json_line, ChatPipeline, ChatRequest, Outcome};
use saferide_core::config::Settings;
use saferide_core::error::{Error, Result};
use saferide_core::knowledge::{KnowledgeBase, ResponseClasses};
use saferide_core::traits::{IntentScorer, Lemmatizer};
use saferide_core::types::{KnowledgeRecord, Lemma};
use saferide_text::Vocabulary;

const GREETING: &str = "Hola, ¿en qué te ayudo?";
const RUST: &str = "Rust es un lenguaje de sistemas.";
const RIDE: &str = "Puedes pedir un viaje desde la app.";
const ORPHAN: &str = "Texto sin registro.";

/// Whitespace split, punctuation dropped, no lemma table.
struct PlainLemmatizer;

impl Lemmatizer for PlainLemmatizer {
    fn max_length(&self) -> usize { usize::MAX }
    fn set_max_length(&mut self, _max_length: usize) {}
    fn lemmatize(&self, text: &str) -> Result<Vec<Lemma>> {
        Ok(text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(Lemma::classify)
            .collect())
    }
}

struct BrokenLemmatizer;

impl Lemmatizer for BrokenLemmatizer {
    fn max_length(&self) -> usize { 0 }
    fn set_max_length(&mut self, _max_length: usize) {}
    fn lemmatize(&self, _text: &str) -> Result<Vec<Lemma>> {
        Err(Error::Lemmatizer("model not loaded".to_string()))
    }
}

/// Always puts all mass on one class and counts invocations.
struct FixedScorer {
    class: usize,
    num_classes: usize,
    calls: Arc<AtomicUsize>,
    seen_len: Arc<AtomicUsize>,
}

impl IntentScorer for FixedScorer {
    fn num_classes(&self) -> usize { self.num_classes }
    fn score(&self, ids: &[u32]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_len.store(ids.len(), Ordering::SeqCst);
        let mut v = vec![0.0; self.num_classes];
        v[self.class] = 1.0;
        Ok(v)
    }
}

struct BrokenScorer { num_classes: usize, short: bool }

impl IntentScorer for BrokenScorer {
    fn num_classes(&self) -> usize { self.num_classes }
    fn score(&self, _ids: &[u32]) -> Result<Vec<f32>> {
        if self.short { Ok(vec![1.0]) } else { Err(Error::Scorer("session crashed".to_string())) }
    }
}

fn vocabulary() -> Vocabulary {
    let words = ["hola", "qué", "es", "rust", "como", "pido", "un", "viaje"];
    let mut index = HashMap::new();
    index.insert("<OOV>".to_string(), 1u32);
    for (i, w) in words.iter().enumerate() {
        index.insert(w.to_string(), i as u32 + 2);
    }
    Vocabulary::from_word_index(index, "<OOV>", None).expect("vocab")
}

fn knowledge() -> KnowledgeBase {
    let record = |completion: &str, intent: &str, examples: &[&str]| KnowledgeRecord {
        completion: completion.to_string(),
        intent: intent.to_string(),
        examples: examples.iter().map(|e| e.to_string()).collect(),
        ..KnowledgeRecord::default()
    };
    KnowledgeBase::from_records(vec![
        record(GREETING, "saludo", &["Hola!"]),
        record(RUST, "programacion", &["fn main() {}", "let x = 1;"]),
        record(RIDE, "transporte", &[]),
        record(RUST, "otro", &["ignored"]),
    ])
}

struct Fixture {
    pipeline: ChatPipeline,
    calls: Arc<AtomicUsize>,
    seen_len: Arc<AtomicUsize>,
}

fn fixture(class: usize) -> Fixture {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen_len = Arc::new(AtomicUsize::new(0));
    let classes = ResponseClasses::from_texts([GREETING, RUST, RIDE, ORPHAN]).expect("classes");
    let scorer = FixedScorer { class, num_classes: classes.len(), calls: calls.clone(), seen_len: seen_len.clone() };
    let pipeline = ChatPipeline::new(
        &Settings::default(),
        Box::new(PlainLemmatizer),
        vocabulary(),
        classes,
        knowledge(),
        Box::new(scorer),
    )
    .expect("pipeline");
    Fixture { pipeline, calls, seen_len }
}

#[test]
fn scenario_a_arithmetic_is_answered_without_classifier() {
    let f = fixture(0);
    let reply = f.pipeline.reply("2 + 2").expect("reply");
    assert_eq!(reply.text, "El resultado de 2 + 2 es 4");
    assert!(matches!(reply.outcome, Outcome::Math { value, .. } if value == 4.0));

    let reply = f.pipeline.reply("Cuanto es 10 / 4?").expect("reply");
    assert_eq!(reply.text, "El resultado de 10 / 4 es 2.5");
    assert_eq!(f.pipeline.reply("cuanto es 1 / 32?").expect("reply").text, "El resultado de 1 / 32 es 0.0312");
    assert_eq!(f.calls.load(Ordering::SeqCst), 0, "classifier never invoked for math");
}

#[test]
fn scenario_b_division_by_zero_asks_to_rephrase() {
    let f = fixture(0);
    let reply = f.pipeline.reply("cuanto es 10 / 0").expect("reply");
    assert_eq!(reply.text, Settings::default().messages.math_failure);
    assert_eq!(reply.outcome, Outcome::MathUnresolved { expression: "10 / 0".to_string() });

    let reply = f.pipeline.reply("el resultado de la carrera").expect("reply");
    assert_eq!(reply.outcome.label(), "math_unresolved", "lead-in phrase alone counts as math intent");
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn scenario_c_out_of_vocabulary_is_refused() {
    let f = fixture(0);
    let reply = f.pipeline.reply("zzz qqq www").expect("reply");
    assert_eq!(reply.text, Settings::default().messages.low_confidence);
    assert_eq!(reply.outcome, Outcome::LowConfidence { oov_ratio: 1.0 });

    let reply = f.pipeline.reply("hola desconocido").expect("reply");
    assert_eq!(reply.outcome, Outcome::LowConfidence { oov_ratio: 0.5 }, "ratio over 2 real tokens, not 600");
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn scenario_d_nothing_left_after_normalization() {
    let f = fixture(0);
    for text in ["¿¡...!?", "   ", ""] {
        let reply = f.pipeline.reply(text).expect("reply");
        assert_eq!(reply.outcome, Outcome::EmptyInput, "{text:?}");
        assert_eq!(reply.text, "Lo siento, no te entendí.");
    }
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn scenario_e_technical_answer_gets_example() {
    let f = fixture(1);
    let reply = f.pipeline.reply("¿Qué es Rust?").expect("reply");
    assert_eq!(reply.text, format!("{RUST}\n\nEjemplo:\nfn main() {{}}"));
    assert_eq!(reply.outcome, Outcome::Answered { class_index: 1, enriched: true });
    assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.seen_len.load(Ordering::SeqCst), 600, "scorer sees the padded vector");
}

#[test]
fn non_technical_and_unmatched_answers_are_canonical() {
    let f = fixture(0);
    assert_eq!(f.pipeline.reply("hola").expect("reply").text, GREETING, "saludo is not a technical intent");

    let f = fixture(2);
    assert_eq!(f.pipeline.reply("como pido un viaje").expect("reply").text, RIDE, "technical list aside, no examples");

    let f = fixture(3);
    let reply = f.pipeline.reply("hola").expect("reply");
    assert_eq!(reply.text, ORPHAN);
    assert_eq!(reply.outcome, Outcome::Answered { class_index: 3, enriched: false });
    assert_eq!(f.pipeline.resolver().unmatched_classes(), vec![3]);
}

#[test]
fn unknown_class_index_is_an_internal_error() {
    let f = fixture(0);
    let err = f.pipeline.resolver().resolve(99).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(!err.is_external(), "a bad index is not a collaborator fault");
}

#[test]
fn collaborator_failures_are_errors_not_messages() {
    let classes = ResponseClasses::from_texts([GREETING, RUST]).expect("classes");
    let pipeline = ChatPipeline::new(
        &Settings::default(),
        Box::new(BrokenLemmatizer),
        vocabulary(),
        classes.clone(),
        knowledge(),
        Box::new(BrokenScorer { num_classes: 2, short: false }),
    )
    .expect("pipeline");
    let err = pipeline.reply("hola").unwrap_err();
    assert!(matches!(err, Error::Lemmatizer(_)));
    assert!(err.is_external());
    assert_eq!(pipeline.reply("3 x 3").expect("math needs no collaborator").text, "El resultado de 3 x 3 es 9");

    let pipeline = ChatPipeline::new(
        &Settings::default(),
        Box::new(PlainLemmatizer),
        vocabulary(),
        classes.clone(),
        knowledge(),
        Box::new(BrokenScorer { num_classes: 2, short: false }),
    )
    .expect("pipeline");
    assert!(matches!(pipeline.reply("hola"), Err(Error::Scorer(_))));

    let pipeline = ChatPipeline::new(
        &Settings::default(),
        Box::new(PlainLemmatizer),
        vocabulary(),
        classes,
        knowledge(),
        Box::new(BrokenScorer { num_classes: 2, short: true }),
    )
    .expect("pipeline");
    assert!(matches!(pipeline.reply("hola"), Err(Error::Scorer(_))), "distribution of the wrong size");
}

#[test]
fn mismatched_scorer_refuses_to_start() {
    let classes = ResponseClasses::from_texts([GREETING, RUST]).expect("classes");
    let result = ChatPipeline::new(
        &Settings::default(),
        Box::new(PlainLemmatizer),
        vocabulary(),
        classes,
        knowledge(),
        Box::new(BrokenScorer { num_classes: 5, short: false }),
    );
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn shell_status_codes() {
    let f = fixture(0);
    let missing = handle(&f.pipeline, &ChatRequest { message: None });
    assert_eq!(missing.status, 400);
    assert_eq!(missing.body.response, "Por favor, envía un mensaje.");
    assert_eq!(handle(&f.pipeline, &ChatRequest { message: Some(String::new()) }).status, 400);

    let ok = handle(&f.pipeline, &ChatRequest { message: Some("2 + 2".to_string()) });
    assert_eq!(ok.status, 200);
    assert_eq!(ok.body.response, "El resultado de 2 + 2 es 4");

    let line = handle_json_line(&f.pipeline, r#"{"message": "hola"}"#);
    let value: serde_json::Value = serde_json::from_str(&line).expect("json");
    assert_eq!(value["status"], 200);
    assert_eq!(value["response"], GREETING);

    let value: serde_json::Value = serde_json::from_str(&handle_json_line(&f.pipeline, "not json")).expect("json");
    assert_eq!(value["status"], 400);

    let broken = ChatPipeline::new(
        &Settings::default(),
        Box::new(PlainLemmatizer),
        vocabulary(),
        ResponseClasses::from_texts([GREETING]).expect("classes"),
        knowledge(),
        Box::new(BrokenScorer { num_classes: 1, short: false }),
    )
    .expect("pipeline");
    let failed = handle(&broken, &ChatRequest { message: Some("hola".to_string()) });
    assert_eq!(failed.status, 500);
    assert_ne!(failed.body.response, Settings::default().messages.empty_input);
}
