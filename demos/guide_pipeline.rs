//! End-to-end pipeline demo over an in-memory corpus.
//!
//! Ingests two small books into a sqlite-vec store, runs a heuristic search
//! answer, then composes a guide. With `OPENAI_API_KEY` set the composition
//! uses the real provider; otherwise a scripted mock stands in so the demo
//! runs offline.
//!
//! ```bash
//! cargo run --example guide_pipeline
//! ```

use std::env;
use std::sync::Arc;

use rig::embeddings::embedding::{Embedding, EmbeddingError, EmbeddingModel};
use tracing_subscriber::FmtSubscriber;

use ritesmith::compose::Composer;
use ritesmith::ingestion::{IndexConfig, ingest_books};
use ritesmith::providers::{CompletionProvider, MockChatProvider, OpenAiChat};
use ritesmith::retrieval::Retriever;
use ritesmith::sources::MemoryBookSource;
use ritesmith::stores::SqlitePassageStore;
use ritesmith::types::RiteError;

#[tokio::main]
async fn main() -> Result<(), RiteError> {
    init_tracing();

    let db_path = env::var("RITESMITH_DB").unwrap_or_else(|_| "./ritual_passages.sqlite".to_string());

    let lakshmi = "1. Clean the altar and spread a red cloth. 2. Place the kalash filled with \
        water and mango leaves. Then light the diya with ghee before sunrise and offer \
        flowers, rice and sweets while reciting om namah. The puja is best performed in \
        the morning on purnima. "
        .repeat(8);
    let durga = "First install the image of the goddess facing east. Next offer coconut, \
        banana, betel leaves and incense. Recite ॐ दुं दुर्गायै नमः। at sunset. After the \
        aarti, distribute the sweets as prasad in the evening. "
        .repeat(8);

    let corpus = MemoryBookSource::new()
        .with_book("lakshmi_puja.pdf", lakshmi.clone())
        .with_book("durga_puja.pdf", durga.clone());

    // Index for search.
    let model = DemoEmbeddingModel;
    let store = Arc::new(SqlitePassageStore::open(&db_path, &model).await?);
    let books = vec![
        ("lakshmi_puja.pdf".to_string(), lakshmi),
        ("durga_puja.pdf".to_string(), durga),
    ];
    let report = ingest_books(store.as_ref(), &books, &IndexConfig::default()).await?;
    println!(
        "Indexed {} passages from {} books (discarded {}, already populated: {})",
        report.passages_indexed, report.books_processed, report.passages_discarded, report.skipped_existing
    );

    // Heuristic path.
    let retriever = Retriever::new(store);
    let results = retriever.search("lakshmi puja materials", 5).await;
    let answer = ritesmith::heuristics::structure_answer("lakshmi puja materials", &results);
    println!("\n=== Heuristic answer ===");
    println!("summary : {}", answer.summary);
    println!("steps   : {}", answer.steps.len());
    println!(
        "material: {}",
        answer
            .materials
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Generative path: real provider when configured, scripted mock otherwise.
    let provider: Arc<dyn CompletionProvider> = match OpenAiChat::from_env() {
        Ok(chat) => {
            println!("\nUsing OpenAI-compatible provider (model {})", chat.model());
            Arc::new(chat)
        }
        Err(err) => {
            println!("\nNo provider configured ({err}); using a scripted mock");
            Arc::new(MockChatProvider::returning(
                r#"{"steps": ["Light the diya"], "materials": [{"name": "ghee", "why": "fuel for the lamp"}]}"#,
            ))
        }
    };

    let composer = Composer::new(provider);
    let guide = composer.compose("lakshmi puja", None, &corpus).await;
    println!("\n=== Composed guide ===\n{}", guide.content_markdown);

    Ok(())
}

fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[derive(Clone)]
struct DemoEmbeddingModel;

impl EmbeddingModel for DemoEmbeddingModel {
    const MAX_DOCUMENTS: usize = 64;

    type Client = ();

    fn make(_client: &Self::Client, _model: impl Into<String>, _dims: Option<usize>) -> Self {
        DemoEmbeddingModel
    }

    fn ndims(&self) -> usize {
        8
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send {
        let docs: Vec<String> = texts.into_iter().collect();
        async move {
            Ok(docs
                .into_iter()
                .map(|document| Embedding {
                    vec: hash_to_vec(&document),
                    document,
                })
                .collect())
        }
    }
}

fn hash_to_vec(text: &str) -> Vec<f64> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..8)
        .map(|i| {
            let bits = seed.rotate_left((i * 8) as u32) ^ ((i as u64) << 24);
            (bits as f64) / u32::MAX as f64
        })
        .collect()
}
