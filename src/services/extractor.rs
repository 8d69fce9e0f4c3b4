use std::sync::OnceLock;
use std::time::Duration;

use lopdf::Document;
use reqwest::Client;

/// Timeout for the document fetch; model inference gets its own, longer one.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared fetch client (lazily initialized).
static FETCH_CLIENT: OnceLock<Client> = OnceLock::new();

fn fetch_client() -> Result<&'static Client, ExtractionError> {
    if let Some(client) = FETCH_CLIENT.get() {
        return Ok(client);
    }
    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(ExtractionError::Fetch)?;
    // Another task may have initialized between our get() and set().
    let _ = FETCH_CLIENT.set(client);
    Ok(FETCH_CLIENT.get().unwrap())
}

/// Fetch a PDF by URL and flatten it to plain text.
pub async fn extract_from_url(url: &str) -> Result<String, ExtractionError> {
    let response = fetch_client()?
        .get(url)
        .send()
        .await
        .map_err(ExtractionError::Fetch)?;

    if !response.status().is_success() {
        return Err(ExtractionError::Status(response.status().as_u16()));
    }

    let bytes = response.bytes().await.map_err(ExtractionError::Fetch)?;
    extract_from_bytes(&bytes)
}

/// Flatten a PDF to plain text: pages in order 1..N, each page's text
/// fragments joined by single spaces, pages concatenated with a trailing
/// space. Lossy and layout-free on purpose; the classifier only needs the
/// words.
pub fn extract_from_bytes(data: &[u8]) -> Result<String, ExtractionError> {
    let doc = Document::load_mem(data).map_err(ExtractionError::Parse)?;

    let mut full_text = String::new();
    for &page_no in doc.get_pages().keys() {
        let page_text = doc.extract_text(&[page_no]).map_err(ExtractionError::Parse)?;
        let flattened = page_text.split_whitespace().collect::<Vec<_>>().join(" ");
        full_text.push_str(&flattened);
        full_text.push(' ');
    }

    let text = full_text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractionError::NoContent);
    }
    Ok(text)
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("failed to fetch document: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("document fetch returned HTTP {0}")]
    Status(u16),

    #[error("failed to parse PDF: {0}")]
    Parse(#[from] lopdf::Error),

    #[error("document contains no extractable text")]
    NoContent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a minimal PDF in memory; one BT/ET block per text fragment.
    fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for fragments in pages {
            let mut operations = Vec::new();
            for (i, fragment) in fragments.iter().enumerate() {
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), (720 - 20 * i as i64).into()]),
                    Operation::new("Tj", vec![Object::string_literal(*fragment)]),
                    Operation::new("ET", vec![]),
                ]);
            }
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn flattens_fragments_with_single_spaces_in_page_order() {
        let data = pdf_with_pages(&[&["Jane Doe", "jane@example.com"], &["Skills: Rust"]]);
        let text = extract_from_bytes(&data).unwrap();

        let first = text.find("Jane Doe").unwrap();
        let contact = text.find("jane@example.com").unwrap();
        let second = text.find("Skills: Rust").unwrap();
        assert!(first < contact && contact < second);
        assert!(!text.contains('\n'));
        assert!(!text.contains("  "), "fragments must be single-space joined: {text:?}");
    }

    #[test]
    fn unparseable_bytes_are_a_parse_error() {
        let err = extract_from_bytes(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    #[test]
    fn document_without_text_is_no_content() {
        let data = pdf_with_pages(&[]);
        let err = extract_from_bytes(&data).unwrap_err();
        assert!(matches!(err, ExtractionError::NoContent));
    }
}
