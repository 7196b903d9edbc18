//! Element definitions and registry
//!
//! An [`ElementDefinition`] is the registered contract for one marker
//! name: input schema, optional output schema, and the asynchronous
//! enrichment function. Definitions are collected into an
//! [`ElementRegistry`], which is immutable for the lifetime of a
//! pipeline run and shared read-only across concurrent enrichments.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::{ElementError, EnrichError};
use crate::types::JsonObject;

/// Asynchronous enrichment of a validated marker input.
///
/// One enrichment runs per discovered marker, concurrently with every
/// other marker's enrichment. `deps` is the shared read-only dependency
/// value supplied at pipeline construction.
#[async_trait]
pub trait Enrich<D>: Send + Sync {
    /// Turn a validated marker input into renderable data
    ///
    /// # Errors
    /// Returns [`EnrichError`] on failure; the failure is contained at
    /// the marker boundary and never aborts the pipeline.
    async fn enrich(&self, input: JsonObject, deps: Arc<D>) -> Result<JsonObject, EnrichError>;
}

#[async_trait]
impl<D, F, Fut> Enrich<D> for F
where
    D: Send + Sync + 'static,
    F: Fn(JsonObject, Arc<D>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<JsonObject, EnrichError>> + Send + 'static,
{
    async fn enrich(&self, input: JsonObject, deps: Arc<D>) -> Result<JsonObject, EnrichError> {
        (self)(input, deps).await
    }
}

/// Registered contract for one marker name
pub struct ElementDefinition<D> {
    name: String,
    description: String,
    input_schema: Value,
    compiled_input: JSONSchema,
    compiled_output: Option<JSONSchema>,
    example: Option<JsonObject>,
    enricher: Arc<dyn Enrich<D>>,
}

impl<D> fmt::Debug for ElementDefinition<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("has_output_schema", &self.compiled_output.is_some())
            .finish_non_exhaustive()
    }
}

impl<D> ElementDefinition<D> {
    /// Create a definition from a name, description, input schema
    /// document, and enrichment function
    ///
    /// # Errors
    /// - `ElementError::InvalidName` if the name is empty or contains
    ///   characters outside `[A-Za-z0-9_]`
    /// - `ElementError::InvalidSchema` if the schema does not compile
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        enricher: impl Enrich<D> + 'static,
    ) -> Result<Self, ElementError> {
        let name = name.into();
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(ElementError::InvalidName(name));
        }

        let compiled_input = compile_schema(&name, &input_schema)?;

        Ok(Self {
            name,
            description: description.into(),
            input_schema,
            compiled_input,
            compiled_output: None,
            example: None,
            enricher: Arc::new(enricher),
        })
    }

    /// Attach an output schema; enriched data is validated against it
    /// before a `Ready` chunk is emitted
    ///
    /// # Errors
    /// Returns `ElementError::InvalidSchema` if the schema does not compile
    pub fn with_output_schema(mut self, output_schema: Value) -> Result<Self, ElementError> {
        self.compiled_output = Some(compile_schema(&self.name, &output_schema)?);
        Ok(self)
    }

    /// Attach an explicit example payload for prompt generation
    #[must_use]
    pub fn with_example(mut self, example: JsonObject) -> Self {
        self.example = Some(example);
        self
    }

    /// Element name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description, surfaced in the generated prompt
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The input schema document as registered
    #[inline]
    #[must_use]
    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Explicit example payload, if any
    #[inline]
    #[must_use]
    pub fn example(&self) -> Option<&JsonObject> {
        self.example.as_ref()
    }

    /// Check a parsed payload against the input schema
    #[inline]
    #[must_use]
    pub fn input_valid(&self, value: &Value) -> bool {
        self.compiled_input.is_valid(value)
    }

    /// Check enriched data against the output schema, if one is declared
    ///
    /// # Errors
    /// Returns `EnrichError::OutputSchema` listing the violations
    pub fn validate_output(&self, data: &Value) -> Result<(), EnrichError> {
        let Some(schema) = &self.compiled_output else {
            return Ok(());
        };

        if let Err(errors) = schema.validate(data) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(EnrichError::OutputSchema(messages.join("; ")));
        }

        Ok(())
    }

    /// Run the enrichment function for a validated input
    ///
    /// # Errors
    /// Propagates the enrichment function's failure
    pub async fn enrich(&self, input: JsonObject, deps: Arc<D>) -> Result<JsonObject, EnrichError> {
        self.enricher.enrich(input, deps).await
    }
}

fn compile_schema(name: &str, schema: &Value) -> Result<JSONSchema, ElementError> {
    JSONSchema::compile(schema).map_err(|e| ElementError::InvalidSchema {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Registry of element definitions, keyed by marker name
///
/// Insertion order is preserved so generated prompts are deterministic.
pub struct ElementRegistry<D> {
    elements: IndexMap<String, Arc<ElementDefinition<D>>>,
}

impl<D> fmt::Debug for ElementRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl<D> Default for ElementRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> ElementRegistry<D> {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: IndexMap::new(),
        }
    }

    /// Register a definition
    ///
    /// # Errors
    /// Returns `ElementError::DuplicateName` if the name is taken
    pub fn register(&mut self, definition: ElementDefinition<D>) -> Result<(), ElementError> {
        let name = definition.name().to_string();
        if self.elements.contains_key(&name) {
            return Err(ElementError::DuplicateName(name));
        }
        self.elements.insert(name, Arc::new(definition));
        Ok(())
    }

    /// Look up a definition by marker name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ElementDefinition<D>>> {
        self.elements.get(name)
    }

    /// Whether a name is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// Registered names in insertion order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.elements.keys().map(String::as_str).collect()
    }

    /// Number of registered elements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate definitions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ElementDefinition<D>>> {
        self.elements.values()
    }
}
