//! Built-in sample document shown in markdown mode before the user types.
//!
//! Callers can override it through
//! [`crate::config::WorkflowConfigBuilder::sample_markdown`]; this constant is
//! used only when no override is provided.

/// Default markdown input.
///
/// Exercises the constructs a preview most often needs to get right:
/// headings, emphasis, lists, a fenced code block, a link and a blockquote.
pub const DEFAULT_SAMPLE_MARKDOWN: &str = r#"# Welcome to docflow

Type markdown on the left and the HTML preview updates as you go.

## What renders

- **Bold** and *italic* text
- Ordered and unordered lists
- Fenced code blocks
- Links and images

## Code

```rust
fn greet(name: &str) -> String {
    format!("Hello, {name}!")
}
```

## Links

See the [CommonMark spec](https://commonmark.org) for the full syntax.

> Blockquotes work too.

1. First
2. Second
3. Third"#;
