use phishgraph::handlers::*;
use phishgraph_core::{Dictionary, FeaturePipeline, PageSnapshot, PipelineConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn pipeline() -> FeaturePipeline {
    let dictionary = Dictionary::from_urls(
        ["http://example.com/login", "https://bank.example.com/verify"],
        64,
    )
    .unwrap();
    let config = PipelineConfig::default()
        .with_max_words(10)
        .with_max_nodes(8)
        .with_vocab_size(64);
    FeaturePipeline::new(config, Arc::new(dictionary)).unwrap()
}

// ============================================================================
// URL List Tests
// ============================================================================

#[test]
fn test_load_lines_trims_and_skips_blanks() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "  http://a.com/x  ")?;
    writeln!(temp_file)?;
    writeln!(temp_file, "\t")?;
    writeln!(temp_file, "b.org")?;

    let lines = load_lines(temp_file.path())?;
    assert_eq!(lines, vec!["http://a.com/x", "b.org"]);
    Ok(())
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "httpbin.org")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "not a valid url!!!")?;
    writeln!(temp_file, "https://api.example.com")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_urls_from_file(&path)?;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://example.com");
    assert_eq!(urls[1], "http://httpbin.org");
    assert_eq!(urls[2], "https://api.example.com");
    Ok(())
}

#[test]
fn test_load_urls_from_file_no_valid_urls() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "not a valid url!!!")?;
    writeln!(temp_file)?;

    assert!(load_urls_from_file(temp_file.path()).is_err());
    Ok(())
}

#[test]
fn test_load_urls_from_missing_file() {
    let path = PathBuf::from("/nonexistent/urls.txt");
    assert!(load_urls_from_file(&path).is_err());
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_load_config_defaults() {
    let config = load_config(None, None, None).unwrap();
    assert_eq!(config, PipelineConfig::default());
}

#[test]
fn test_load_config_flags_override_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    write!(
        temp_file,
        r#"{{"max_words": 30, "max_nodes": 50, "vocab_size": 500}}"#
    )?;

    let config = load_config(Some(temp_file.path()), None, Some(12))?;
    assert_eq!(config.max_words, 30);
    assert_eq!(config.max_nodes, 12);
    assert_eq!(config.vocab_size, 500);
    Ok(())
}

#[test]
fn test_load_config_rejects_zero_override() {
    assert!(load_config(None, Some(0), None).is_err());
}

// ============================================================================
// Dataset Tests
// ============================================================================

#[test]
fn test_load_pages_with_and_without_labels() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(
        temp_file,
        r#"{{"url": "http://example.com/login", "html": "<html><body></body></html>", "label": 1}}"#
    )?;
    writeln!(temp_file)?;
    writeln!(temp_file, r#"{{"url": "http://example.org"}}"#)?;

    let pages = load_pages(temp_file.path())?;
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].label, Some(1));
    assert!(pages[0].page.has_html());
    assert_eq!(pages[1].label, None);
    assert_eq!(pages[1].page.html, None);
    Ok(())
}

#[test]
fn test_load_pages_reports_bad_line() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, r#"{{"url": "http://example.com"}}"#)?;
    writeln!(temp_file, "not json")?;

    let err = load_pages(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains(":2:"));
    Ok(())
}

#[test]
fn test_encode_pages_preserves_order() {
    let pipeline = pipeline();
    let pages: Vec<LabeledPage> = (0..50)
        .map(|i| LabeledPage {
            page: PageSnapshot::new(
                format!("http://example.com/page{}", i),
                (i % 2 == 0).then(|| "<html><body><a href='/x'>x</a></body></html>".to_string()),
            ),
            label: Some((i % 2) as u8),
        })
        .collect();

    let records = encode_pages(&pipeline, &pages);

    assert_eq!(records.len(), 50);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.url, format!("http://example.com/page{}", i));
        assert_eq!(record.label, Some((i % 2) as u8));
        assert_eq!(record.url_vector.len(), 10);
        assert_eq!(record.adjacency.len(), 8);
        assert_eq!(record.low_confidence, i % 2 == 1);
    }
}

#[test]
fn test_write_jsonl_one_record_per_line() {
    let pages = vec![
        LabeledPage {
            page: PageSnapshot::url_only("http://a.com".to_string()),
            label: Some(0),
        },
        LabeledPage {
            page: PageSnapshot::new("http://b.com".to_string(), Some("<p>".to_string())),
            label: None,
        },
    ];

    let mut buffer = Vec::new();
    write_jsonl(&mut buffer, &pages).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(text.ends_with('\n'));
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["url"], "http://a.com");
    assert_eq!(first["label"], 0);
    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert!(second.get("label").is_none());
}

#[test]
fn test_written_pages_load_back() -> Result<(), Box<dyn std::error::Error>> {
    let pages = vec![LabeledPage {
        page: PageSnapshot::new(
            "http://example.com/login".to_string(),
            Some("<html><body><form></form></body></html>".to_string()),
        ),
        label: Some(1),
    }];

    let mut temp_file = NamedTempFile::new()?;
    write_jsonl(temp_file.as_file_mut(), &pages)?;

    assert_eq!(load_pages(temp_file.path())?, pages);
    Ok(())
}
