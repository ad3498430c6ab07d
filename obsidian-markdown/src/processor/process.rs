//! Error-recovering entry points for rendering.
use log::error;

use super::types::MarkdownProcessor;

/// HTML returned when a render panics outright.
pub const CRITICAL_ERROR_HTML: &str =
  "<div class=\"error\">Critical error processing markdown content</div>";

/// Process markdown content with error recovery.
///
/// A panic anywhere in the pipeline is logged and replaced by
/// [`CRITICAL_ERROR_HTML`] instead of unwinding into the caller.
///
/// # Arguments
///
/// * `processor` - The configured markdown processor
/// * `content` - The raw markdown content to process
///
/// # Returns
///
/// The rendered HTML, or the error block on panic
#[must_use]
pub fn process_with_recovery(
  processor: &MarkdownProcessor,
  content: &str,
) -> String {
  match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    processor.render(content)
  })) {
    Ok(result) => result,
    Err(panic_err) => {
      error!("Panic during markdown processing: {panic_err:?}");
      CRITICAL_ERROR_HTML.to_string()
    },
  }
}

/// Safely run a single processing step with error recovery.
///
/// Ensures that a failing step degrades to its input (or `fallback`) rather
/// than failing the whole document.
///
/// # Arguments
///
/// * `content` - The content to process
/// * `processor_fn` - The processing function to apply
/// * `fallback` - Fallback content to use if processing fails
///
/// # Returns
///
/// The processed content or fallback on error
pub fn process_safe<F>(content: &str, processor_fn: F, fallback: &str) -> String
where
  F: FnOnce(&str) -> String,
{
  if content.is_empty() {
    return String::new();
  }

  let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    processor_fn(content)
  }));

  match result {
    Ok(processed_text) => processed_text,
    Err(e) => {
      if let Some(error_msg) = e.downcast_ref::<String>() {
        error!("Error processing markdown: {error_msg}");
      } else if let Some(error_msg) = e.downcast_ref::<&str>() {
        error!("Error processing markdown: {error_msg}");
      } else {
        error!("Unknown error occurred while processing markdown");
      }

      if fallback.is_empty() {
        content.to_string()
      } else {
        fallback.to_string()
      }
    },
  }
}
