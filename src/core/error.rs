/// Structural failures of a compute run.
///
/// None of these are caused by unusual tax situations (those clamp); each one means a
/// rule module is wired incorrectly or the caller assembled an invalid return.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ComputeError {
    #[error("module {module} read node {node} which has not been computed")]
    MissingNode { node: String, module: String },
    #[error("node {node} written twice (second write by module {module})")]
    DuplicateNode { node: String, module: String },
    #[error("module {module} expected a {expected} value at {node} but found {found}")]
    ValueKind {
        node: String,
        module: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("module {module} may only write nodes under '{namespace}', attempted {node}")]
    NamespaceViolation {
        node: String,
        module: String,
        namespace: String,
    },
    #[error("node {node} lists input {input} which is not in the result")]
    BrokenClosure { node: String, input: String },
    #[error("unsupported tax year: {0}")]
    UnsupportedTaxYear(i32),
    #[error("no rule module registered for jurisdiction '{0}'")]
    UnsupportedJurisdiction(String),
}

/// Failures reading a tax return document
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("invalid tax return: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read tax return: {0}")]
    Io(#[from] std::io::Error),
}
