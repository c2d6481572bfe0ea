use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("error extracting text from {filename}: {reason}")]
    Extraction { filename: String, reason: String },

    #[error("no text could be extracted from {filename}")]
    NoText { filename: String },
}

/// Extracts the text layer of an in-memory PDF.
///
/// pdf-extract panics on some malformed documents; those panics are
/// reported as `Extraction` errors. CPU-bound: run on the blocking pool.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String, PdfError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    let text = match outcome {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            return Err(PdfError::Extraction {
                filename: filename.to_string(),
                reason: e.to_string(),
            })
        }
        Err(_) => {
            return Err(PdfError::Extraction {
                filename: filename.to_string(),
                reason: "parser panicked on malformed document".to_string(),
            })
        }
    };

    if text.trim().is_empty() {
        return Err(PdfError::NoText {
            filename: filename.to_string(),
        });
    }
    Ok(text)
}

#[cfg(test)]
pub mod testing {
    /// Builds a one-page PDF showing `text` in Helvetica.
    /// `text` must not contain parentheses or backslashes.
    pub fn single_page_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }

        let xref_offset = pdf.len();
        let size = objects.len() + 1;
        pdf.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n")
                .as_bytes(),
        );
        pdf
    }
}
