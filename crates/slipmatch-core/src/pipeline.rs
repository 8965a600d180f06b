use crate::classify::{classify_document, resolve_roles, PairRoles};
use crate::config::Config;
use crate::error::SlipmatchError;
use crate::extraction::pdftoppm::PdftoppmRasterizer;
use crate::extraction::tesseract::TesseractRecognizer;
use crate::extraction::{PageRasterizer, TextRecognizer};
use crate::folder::empty_or_make_new;
use crate::matching::{match_orders, LabelPage, SlipPage};
use crate::model::{DocumentKind, OrderId, OrderRecord, Page};
use crate::parsing::{extract_order_id, extract_tracking_number, locate_index_pages};
use crate::voting::MultiResolutionVoter;
use std::path::{Path, PathBuf};

/// Downstream consumer of a finished job: compositing, printing, reporting.
pub trait OrderSink {
    /// Receive the job's records in ascending packing-slip page order.
    fn consume(&mut self, records: &[OrderRecord]) -> Result<(), SlipmatchError>;
}

/// One job: two PDFs in, joined order records out.
pub struct Pipeline {
    rasterizer: Box<dyn PageRasterizer>,
    recognizer: Box<dyn TextRecognizer>,
    work_dir: PathBuf,
    base_dpi: u32,
    sweep_levels: Vec<u32>,
    sweep_workers: usize,
}

/// A PDF rendered at the base resolution.
struct RenderedDocument {
    id: String,
    pdf: PathBuf,
    pages: Vec<Page>,
}

impl Pipeline {
    pub fn new(
        rasterizer: Box<dyn PageRasterizer>,
        recognizer: Box<dyn TextRecognizer>,
        config: &Config,
    ) -> Self {
        Pipeline {
            rasterizer,
            recognizer,
            work_dir: config.work_dir.clone(),
            base_dpi: config.base_dpi,
            sweep_levels: config.sweep.levels(),
            sweep_workers: config.sweep_workers,
        }
    }

    /// Pipeline backed by pdftoppm and tesseract as configured.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(PdftoppmRasterizer::with_binary(&config.tools.pdftoppm)),
            Box::new(TesseractRecognizer::with_options(
                &config.tools.tesseract,
                &config.tools.ocr_language,
            )),
            config,
        )
    }

    pub fn backend_names(&self) -> (&str, &str) {
        (self.rasterizer.backend_name(), self.recognizer.backend_name())
    }

    /// Run a job and hand its records to `sink`. Rendered pages are deleted
    /// afterwards whether the job succeeded or not.
    pub fn process(
        &self,
        first: &Path,
        second: &Path,
        sink: &mut dyn OrderSink,
    ) -> Result<usize, SlipmatchError> {
        let result = self.run_job(first, second).and_then(|records| {
            sink.consume(&records)?;
            Ok(records.len())
        });

        if let Err(e) = empty_or_make_new(&self.work_dir) {
            tracing::warn!(dir = %self.work_dir.display(), error = %e, "could not discard rendered pages");
        }

        result
    }

    /// Pair two PDFs into order records. Which one is the packing slip is
    /// decided from their content.
    pub fn run_job(&self, first: &Path, second: &Path) -> Result<Vec<OrderRecord>, SlipmatchError> {
        tracing::info!(first = %first.display(), second = %second.display(), "processing pair");

        let first_dir = self.work_dir.join("first");
        let second_dir = self.work_dir.join("second");
        let sweep_dir = self.work_dir.join("sweep");
        for dir in [&first_dir, &second_dir, &sweep_dir] {
            empty_or_make_new(dir)?;
        }

        let first_doc = self.render(first, &first_dir)?;
        let second_doc = self.render(second, &second_dir)?;

        let first_text = self.first_page_text(&first_doc)?;
        let second_text = self.first_page_text(&second_doc)?;
        let first_kind = classify_document(&first_text);
        let second_kind = classify_document(&second_text);
        tracing::info!(
            first = %first_doc.id,
            first_kind = %first_kind,
            second = %second_doc.id,
            second_kind = %second_kind,
            "classified documents"
        );

        let (slip_doc, slip_first, label_doc, label_first) =
            match resolve_roles(first_kind, second_kind)? {
                PairRoles::FirstIsSlip => (first_doc, first_text, second_doc, second_text),
                PairRoles::SecondIsSlip => (second_doc, second_text, first_doc, first_text),
            };

        let slips = self.read_slips(&slip_doc, slip_first)?;
        let labels = self.read_labels(&label_doc, label_first, &sweep_dir)?;

        let records = match_orders(&slips, &labels)?;
        tracing::info!(orders = records.len(), "matched packing slips to shipping labels");
        Ok(records)
    }

    /// Render only the first page of `pdf` and classify it.
    pub fn classify_pdf(&self, pdf: &Path) -> Result<DocumentKind, SlipmatchError> {
        let scratch = tempfile::tempdir()?;
        let images = self
            .rasterizer
            .rasterize(pdf, self.base_dpi, Some(1..=1), scratch.path())?;
        let Some(image) = images.values().next() else {
            return Ok(DocumentKind::Unknown);
        };
        let text = self.recognizer.recognize(image)?;
        Ok(classify_document(&text))
    }

    fn render(&self, pdf: &Path, out_dir: &Path) -> Result<RenderedDocument, SlipmatchError> {
        let id = document_id(pdf);
        let images = self.rasterizer.rasterize(pdf, self.base_dpi, None, out_dir)?;
        tracing::info!(document = %id, pages = images.len(), dpi = self.base_dpi, "rendered pages");

        let pages = images
            .into_iter()
            .map(|(page_number, image_path)| Page {
                page_number,
                image_path,
                source_document_id: id.clone(),
            })
            .collect();

        Ok(RenderedDocument {
            id,
            pdf: pdf.to_path_buf(),
            pages,
        })
    }

    fn first_page_text(&self, doc: &RenderedDocument) -> Result<String, SlipmatchError> {
        let page = doc.pages.first().ok_or_else(|| SlipmatchError::Extraction {
            document: doc.id.clone(),
            page: 1,
            reason: "document has no pages".into(),
        })?;
        self.recognizer.recognize(&page.image_path)
    }

    /// OCR every page, reusing the already-read first page.
    fn read_pages(
        &self,
        doc: &RenderedDocument,
        first_text: String,
    ) -> Result<Vec<String>, SlipmatchError> {
        let mut texts = Vec::with_capacity(doc.pages.len());
        texts.push(first_text);
        for page in doc.pages.iter().skip(1) {
            texts.push(self.recognizer.recognize(&page.image_path)?);
        }
        Ok(texts)
    }

    fn read_slips(
        &self,
        doc: &RenderedDocument,
        first_text: String,
    ) -> Result<Vec<SlipPage>, SlipmatchError> {
        let texts = self.read_pages(doc, first_text)?;

        doc.pages
            .iter()
            .zip(&texts)
            .map(|(page, text)| {
                let order_id =
                    extract_order_id(text).ok_or_else(|| SlipmatchError::Extraction {
                        document: doc.id.clone(),
                        page: page.page_number,
                        reason: "no 'Order ID:' found on packing slip".into(),
                    })?;
                tracing::debug!(page = page.page_number, %order_id, "read packing slip");
                Ok(SlipPage {
                    page: page.clone(),
                    order_id,
                })
            })
            .collect()
    }

    fn read_labels(
        &self,
        doc: &RenderedDocument,
        first_text: String,
        sweep_dir: &Path,
    ) -> Result<Vec<LabelPage>, SlipmatchError> {
        let texts = self.read_pages(doc, first_text)?;

        let index_pages = locate_index_pages(&texts).ok_or_else(|| SlipmatchError::Extraction {
            document: doc.id.clone(),
            page: texts.len(),
            reason: "no order-ID index page at the end of the shipping labels".into(),
        })?;
        let label_count = index_pages.start() - 1;
        tracing::info!(
            document = %doc.id,
            labels = label_count,
            index_pages = index_pages.end() - index_pages.start() + 1,
            "located index pages"
        );

        if label_count == 0 {
            return Err(SlipmatchError::Join(
                "the shipping label document holds only index pages".into(),
            ));
        }

        let voter = MultiResolutionVoter::new(
            self.rasterizer.as_ref(),
            self.recognizer.as_ref(),
            self.sweep_levels.clone(),
            self.sweep_workers,
        );
        let listed = voter.read_index(&doc.pdf, index_pages, sweep_dir)?;

        if listed.len() != label_count {
            return Err(SlipmatchError::Join(format!(
                "index pages list {} order(s) but there are {} label page(s)",
                listed.len(),
                label_count
            )));
        }

        doc.pages[..label_count]
            .iter()
            .zip(&texts)
            .zip(listed)
            .map(|((page, text), order_id)| {
                let tracking_number =
                    extract_tracking_number(text).ok_or_else(|| SlipmatchError::TrackingNotFound {
                        page: page.page_number,
                        text: text.clone(),
                    })?;
                tracing::debug!(page = page.page_number, %order_id, tracking = %tracking_number, "read shipping label");
                Ok(LabelPage {
                    page: page.clone(),
                    order_id: OrderId::new(order_id),
                    tracking_number,
                })
            })
            .collect()
    }
}

fn document_id(pdf: &Path) -> String {
    pdf.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf.display().to_string())
}
