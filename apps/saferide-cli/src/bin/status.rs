use saferide_chat::ResponseResolver;
use saferide_core::config::Config;
use saferide_core::knowledge::{KnowledgeBase, ResponseClasses};
use saferide_model::get_default_scorer;
use saferide_text::Vocabulary;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let settings = Config::load()?.settings()?;
    let paths = &settings.artifacts;
    println!("artifacts: {}", paths.base().display());

    let vocab = Vocabulary::load(&paths.vocabulary_path())?;
    println!("vocabulary: tokens={} oov_id={} max_id={}", vocab.len(), vocab.oov_id(), vocab.max_id());

    let classes = ResponseClasses::load(&paths.response_map_path())?;
    let knowledge = KnowledgeBase::load(&paths.knowledge_base_path())?;
    println!("response classes: {}", classes.len());
    println!("knowledge records: {}", knowledge.len());

    for (text, count) in knowledge.shared_completions() {
        println!("  shared completion ({count} records, first wins): {text:?}");
    }

    let resolver = ResponseResolver::new(classes, knowledge, settings.technical_intents.iter().cloned());
    let unmatched = resolver.unmatched_classes();
    println!("classes without knowledge record: {}", unmatched.len());
    for idx in unmatched {
        println!("  {idx}: {:?}", resolver.classes().text(idx).unwrap_or_default());
    }

    match get_default_scorer(&paths.model_path(), resolver.classes().len()) {
        Ok(scorer) => {
            let ok = scorer.num_classes() == resolver.classes().len();
            println!("scorer: classes={} matches_response_map={}", scorer.num_classes(), ok);
            if let Some(capacity) = scorer.token_capacity() {
                println!("scorer: embedding rows={} covers_vocabulary={}", capacity, (vocab.max_id() as usize) < capacity);
            }
        }
        Err(e) => println!("scorer: unavailable ({e})"),
    }
    Ok(())
}
