//! Search query building

/// A query predicate in Prismic syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    operator: &'static str,
    path: String,
    value: String,
}

impl Predicate {
    /// `at(path, "value")`: the field at `path` equals `value`
    pub fn at(path: &str, value: &str) -> Self {
        Self {
            operator: "at",
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    /// Render as `[at(document.type, "posts")]`
    pub fn render(&self) -> String {
        let value = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("[{}({}, \"{}\")]", self.operator, self.path, value)
    }
}

/// A document search: predicates, field projection and page size
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub fetch: Vec<String>,
    pub page_size: Option<usize>,
}

impl Query {
    /// Query all documents of a custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self {
            predicates: vec![Predicate::at("document.type", doc_type)],
            ..Default::default()
        }
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// The `q` parameter
    pub fn q(&self) -> String {
        let predicates: String = self.predicates.iter().map(Predicate::render).collect();
        format!("[{}]", predicates)
    }

    /// Query string pairs, without `ref` and `access_token`
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.q())];
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if let Some(page_size) = self.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        params
    }
}
