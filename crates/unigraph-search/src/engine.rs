//! Answer generation over the assembled context

use crate::context::{ContextData, LocalContext, LocalSearchContextBuilder};
use crate::error::SearchError;
use crate::mentions::MappedEntity;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use unigraph_llm::Oracle;

const LOCAL_SEARCH_SYSTEM_PROMPT: &str = r#"
---Role---

You are a helpful assistant responding to questions about data in the tables provided.


---Goal---

Generate a response of the target length and format that responds to the user's question, summarizing all information in the input data tables appropriate for the response length and format, and incorporating any relevant general knowledge.

If you don't know the answer, just say so. Do not make anything up.

Points supported by data should list their data references as follows:

"This is an example sentence supported by multiple data references [Data: <dataset name> (record ids); <dataset name> (record ids)]."

Rules:
    1. If the answer is a table, references must be placed outside the table.
    2. References follow the sentence they support; do not collect them at the end.
    3. Every referenced record id must exist in the data tables.
    4. List record ids one by one; never write ranges such as "1-5".
    5. Use the citation format exactly: [Data: <dataset name> (record ids); <dataset name> (record ids)].

For example:

"Person X is the owner of Company Y and subject to many allegations of wrongdoing [Data: Sources (15, 16); Reports (1); Entities (5, 7); Relationships (23)]."

where 15, 16, 1, 5, 7 and 23 are the ids (not the positions) of the data records.

Do not include information where the supporting evidence for it is not provided.


---Target response length and format---

{response_type}


---Data tables---

{context_data}


---Query---

{query}


---Target response length and format---

{response_type}

Add sections and commentary to the response as appropriate for the length and format. Style the response in markdown.

Answer in the same language as the query.
"#;

/// Render the answer prompt
pub fn answer_prompt(query: &str, context_text: &str, response_type: &str) -> String {
    LOCAL_SEARCH_SYSTEM_PROMPT
        .replace("{response_type}", response_type)
        .replace("{context_data}", context_text)
        .replace("{query}", query)
        .trim()
        .to_string()
}

/// Answer to a query with the context it was generated from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Generated answer
    pub answer: String,
    /// Context tables as text
    pub context_text: String,
    /// Context tables as records
    pub context_data: ContextData,
    /// Entities the query mapped to, best first
    pub mapped: Vec<MappedEntity>,
    /// Token count of the context
    pub context_tokens: usize,
    /// Wall time in milliseconds
    pub processing_time_ms: u64,
}

/// Answers queries over one indexed graph
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use unigraph_llm::MockOracle;
/// use unigraph_search::{LocalSearchContextBuilder, LocalSearchEngine, SearchConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let builder = LocalSearchContextBuilder::new(vec![], vec![], vec![], SearchConfig::default())?;
/// let engine = LocalSearchEngine::new(Arc::new(MockOracle::default()), builder);
/// let result = engine.search("小明喜欢什么", 1, false).await?;
/// println!("{}", result.answer);
/// # Ok(())
/// # }
/// ```
pub struct LocalSearchEngine {
    oracle: Arc<dyn Oracle>,
    builder: LocalSearchContextBuilder,
}

impl LocalSearchEngine {
    /// Create an engine answering with `oracle` over `builder`'s graph
    pub fn new(oracle: Arc<dyn Oracle>, builder: LocalSearchContextBuilder) -> Self {
        Self { oracle, builder }
    }

    /// The context builder
    pub fn builder(&self) -> &LocalSearchContextBuilder {
        &self.builder
    }

    /// Answer `query` using reports down to 1-based `depth`
    ///
    /// The answer is generated once, without retries. When the configured
    /// deadline passes, every in-flight call is dropped and
    /// [`SearchError::Timeout`] is returned.
    pub async fn search(
        &self,
        query: &str,
        depth: u32,
        infer: bool,
    ) -> Result<SearchResult, SearchError> {
        match self.builder.config().timeout() {
            Some(limit) => tokio::time::timeout(limit, self.run(query, depth, infer))
                .await
                .map_err(|_| SearchError::Timeout)?,
            None => self.run(query, depth, infer).await,
        }
    }

    async fn run(&self, query: &str, depth: u32, infer: bool) -> Result<SearchResult, SearchError> {
        let start = Instant::now();
        let LocalContext {
            mapped,
            text,
            data,
            tokens,
            ..
        } = self
            .builder
            .build_context(self.oracle.as_ref(), query, depth, infer)
            .await?;

        let prompt = answer_prompt(query, &text, &self.builder.config().response_type);
        let answer = self.oracle.get_response(&prompt).await?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Answered query in {}ms ({} context tokens)",
            processing_time_ms, tokens
        );
        Ok(SearchResult {
            answer,
            context_text: text,
            context_data: data,
            mapped,
            context_tokens: tokens,
            processing_time_ms,
        })
    }
}
