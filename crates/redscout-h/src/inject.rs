use chromiumoxide::Page;
use chromiumoxide::cdp::js_protocol::runtime::{CallFunctionOnParams, EvaluateParams};
use chromiumoxide::element::Element;
use redscout_common::BackendError;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Upper bound for a single script; a dialog can block the JS thread.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors while the page is navigating.
const MAX_CONTEXT_RETRIES: u32 = 10;

const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Whether the page's execution context is gone (mid-navigation).
pub fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Retry `operation` while it fails with a context error. Any other error
/// is returned immediately.
pub async fn retry_on_context_error<T, E, F, Fut>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, String>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let err_str = e.to_string();
                if !is_context_error(&err_str) {
                    return Err(err_str);
                }
                tracing::debug!(
                    "{} context error (attempt {}/{}), retrying...",
                    operation_name,
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
        }
    }

    Err(last_error.unwrap_or_else(|| format!("{} failed after retries", operation_name)))
}

/// Call a function expression with JSON arguments and return its value.
pub async fn call_function(
    page: &Page,
    function: &str,
    args: &[Value],
) -> Result<Value, BackendError> {
    let args = args
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    let expression = format!("({})({})", function, args);
    evaluate(page, &expression).await
}

/// Evaluate an expression, awaiting promises, returning `null` for `undefined`.
pub async fn evaluate(page: &Page, expression: &str) -> Result<Value, BackendError> {
    let result = retry_on_context_error("Evaluate", || async move {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(|e| format!("Invalid evaluate params: {}", e))?;
        match tokio::time::timeout(EVAL_TIMEOUT, page.evaluate_expression(params)).await {
            Err(_) => Err("Script timed out, possibly blocked by a dialog".to_string()),
            Ok(Err(e)) => Err(e.to_string()),
            Ok(Ok(result)) => Ok(result.value().cloned().unwrap_or(Value::Null)),
        }
    })
    .await;

    result.map_err(BackendError::Script)
}

/// Call a function declaration with `this` bound to `element`.
pub async fn call_on_element(
    page: &Page,
    element: &Element,
    function: &str,
) -> Result<Value, BackendError> {
    let params = CallFunctionOnParams::builder()
        .function_declaration(function)
        .object_id(element.remote_object_id.clone())
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(BackendError::Script)?;

    let response = tokio::time::timeout(EVAL_TIMEOUT, page.execute(params))
        .await
        .map_err(|_| BackendError::Timeout {
            operation: "element script".into(),
        })?
        .map_err(|e| BackendError::Script(e.to_string()))?;

    if let Some(details) = &response.result.exception_details {
        return Err(BackendError::Script(details.text.clone()));
    }
    Ok(response.result.result.value.clone().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_errors_are_recognised() {
        assert!(is_context_error("Execution context was destroyed."));
        assert!(is_context_error("Error -32000: Cannot find context with specified id"));
        assert!(!is_context_error("ReferenceError: x is not defined"));
    }

    #[tokio::test]
    async fn context_errors_are_retried_until_success() {
        let mut attempts = 0;
        let value = retry_on_context_error("probe", || {
            attempts += 1;
            let attempt = attempts;
            async move {
                if attempt < 3 {
                    Err("Cannot find context with specified id")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(value, Ok(3));
    }

    #[tokio::test]
    async fn other_errors_fail_fast() {
        let mut attempts = 0;
        let value: Result<(), String> = retry_on_context_error("probe", || {
            attempts += 1;
            async { Err("SyntaxError") }
        })
        .await;
        assert_eq!(value, Err("SyntaxError".to_string()));
        assert_eq!(attempts, 1);
    }
}
