//! Turns the detections of one image into a structured receipt record by
//! cropping each field and running it through an OCR engine.
use std::io::Cursor;

use image::{imageops, ImageFormat, RgbImage};
use receipt_ocr::{OcrEngine, OcrInput};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detection::{Detection, PixelBox};
use crate::error::Result;
use crate::fields::{of_field, select_single, ReceiptField};
use crate::pairing::pair_line_items;

/// OCR text of one receipt row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemText {
    pub product: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
}

/// Per-image extraction result, serialized as the JSON output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub company_name: Option<String>,
    pub phone_number: Option<String>,
    pub receipt_id: Option<String>,
    pub items: Vec<LineItemText>,
}

/// Copies the half-open region `[x1, x2) x [y1, y2)` out of `image`.
///
/// Returns `None` when the region is empty after clamping to the image.
pub fn crop(image: &RgbImage, bbox: &PixelBox) -> Option<RgbImage> {
    let x2 = bbox.x2.min(image.width());
    let y2 = bbox.y2.min(image.height());
    if x2 <= bbox.x1 || y2 <= bbox.y1 {
        return None;
    }
    Some(imageops::crop_imm(image, bbox.x1, bbox.y1, x2 - bbox.x1, y2 - bbox.y1).to_image())
}

pub struct RecordExtractor<'e> {
    ocr: &'e dyn OcrEngine,
}

impl<'e> RecordExtractor<'e> {
    pub fn new(ocr: &'e dyn OcrEngine) -> Self {
        Self { ocr }
    }

    /// Recognized text inside `bbox`, trimmed. Empty regions
    /// read as an empty string without calling the engine.
    pub async fn read_region(&self, image: &RgbImage, bbox: &PixelBox) -> Result<String> {
        let Some(region) = crop(image, bbox) else {
            debug!(?bbox, "empty crop, skipping OCR");
            return Ok(String::new());
        };

        let mut png = Vec::new();
        region.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        let output = self.ocr.recognize(&OcrInput::Bytes(png)).await?;
        Ok(output.joined_text())
    }

    async fn read_detection(
        &self,
        image: &RgbImage,
        detection: Option<&Detection>,
    ) -> Result<Option<String>> {
        match detection {
            Some(d) => Ok(Some(self.read_region(image, &d.bbox).await?)),
            None => Ok(None),
        }
    }

    /// Builds the record for one image. Images are processed one field at a
    /// time; OCR failures abort the record.
    pub async fn extract(
        &self,
        image: &RgbImage,
        detections: &[Detection],
    ) -> Result<StructuredRecord> {
        let company_name = self
            .read_detection(image, select_single(detections, ReceiptField::CompanyName))
            .await?;
        let phone_number = self
            .read_detection(image, select_single(detections, ReceiptField::PhoneNumber))
            .await?;
        let receipt_id = self
            .read_detection(image, select_single(detections, ReceiptField::ReceiptId))
            .await?;

        let products = of_field(detections, ReceiptField::Product);
        let quantities = of_field(detections, ReceiptField::Quantity);
        let unit_prices = of_field(detections, ReceiptField::UnitPrice);

        let mut items = Vec::new();
        for line in pair_line_items(&products, &quantities, &unit_prices) {
            items.push(LineItemText {
                product: self.read_detection(image, Some(line.product)).await?,
                quantity: self.read_detection(image, line.quantity).await?,
                unit_price: self.read_detection(image, line.unit_price).await?,
            });
        }
        debug!(items = items.len(), "extracted receipt record");

        Ok(StructuredRecord {
            company_name,
            phone_number,
            receipt_id,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::Rgb;
    use receipt_ocr::{OcrError, OcrOutput};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports the size of the crop it was given as `WxH`.
    struct SizeOcr {
        calls: AtomicUsize,
    }

    impl SizeOcr {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OcrEngine for SizeOcr {
        async fn recognize(&self, input: &OcrInput) -> std::result::Result<OcrOutput, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let OcrInput::Bytes(bytes) = input else {
                return Err(OcrError::Unsupported);
            };
            let img = image::load_from_memory(bytes)
                .map_err(|e| OcrError::InvalidInput(e.to_string()))?;
            Ok(OcrOutput {
                text: format!("  {}x{}\n", img.width(), img.height()),
                regions: vec![],
            })
        }
    }

    struct FailingOcr;

    #[async_trait]
    impl OcrEngine for FailingOcr {
        async fn recognize(&self, _input: &OcrInput) -> std::result::Result<OcrOutput, OcrError> {
            Err(OcrError::EngineError("model not loaded".to_string()))
        }
    }

    fn det(name: &str, conf: f32, bbox: (u32, u32, u32, u32)) -> Detection {
        Detection {
            class_id: 0,
            class_name: name.to_string(),
            bbox: PixelBox::new(bbox.0, bbox.1, bbox.2, bbox.3),
            confidence: conf,
        }
    }

    fn canvas() -> RgbImage {
        RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_crop_clamps_and_rejects_empty() {
        let img = canvas();
        let c = crop(&img, &PixelBox::new(190, 90, 250, 150)).unwrap();
        assert_eq!(c.dimensions(), (10, 10));
        assert!(crop(&img, &PixelBox::new(10, 10, 10, 40)).is_none());
        assert!(crop(&img, &PixelBox::new(10, 40, 30, 20)).is_none());
    }

    #[tokio::test]
    async fn test_extract_builds_record() {
        let ocr = SizeOcr::new();
        let extractor = RecordExtractor::new(&ocr);
        let dets = vec![
            det("company_name", 0.3, (0, 0, 10, 5)),
            det("company_name", 0.9, (0, 0, 40, 8)),
            det("product", 0.8, (0, 60, 50, 70)),
            det("product", 0.8, (0, 30, 60, 40)),
            det("quantity", 0.8, (100, 31, 110, 39)),
            det("unit_price", 0.8, (150, 60, 180, 70)),
        ];

        let record = extractor.extract(&canvas(), &dets).await.unwrap();

        assert_eq!(record.company_name.as_deref(), Some("40x8"));
        assert_eq!(record.phone_number, None);
        assert_eq!(record.receipt_id, None);
        assert_eq!(
            record.items,
            vec![
                LineItemText {
                    product: Some("60x10".to_string()),
                    quantity: Some("10x8".to_string()),
                    unit_price: None,
                },
                LineItemText {
                    product: Some("50x10".to_string()),
                    quantity: None,
                    unit_price: Some("30x10".to_string()),
                },
            ]
        );
        // one single field plus four line-item crops
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_no_detections() {
        let ocr = SizeOcr::new();
        let record = RecordExtractor::new(&ocr)
            .extract(&canvas(), &[])
            .await
            .unwrap();
        assert_eq!(record, StructuredRecord::default());
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_crop_reads_as_empty_string() {
        let ocr = SizeOcr::new();
        let dets = vec![det("receipt_id", 0.5, (20, 20, 20, 30))];
        let record = RecordExtractor::new(&ocr)
            .extract(&canvas(), &dets)
            .await
            .unwrap();
        assert_eq!(record.receipt_id.as_deref(), Some(""));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ocr_failure_propagates() {
        let dets = vec![det("phone_number", 0.5, (0, 0, 20, 20))];
        let result = RecordExtractor::new(&FailingOcr)
            .extract(&canvas(), &dets)
            .await;
        assert!(matches!(result, Err(crate::error::ReceiptError::Ocr(_))));
    }

    #[test]
    fn test_record_json_shape() {
        let record = StructuredRecord {
            company_name: Some("ACME".to_string()),
            phone_number: None,
            receipt_id: None,
            items: vec![LineItemText {
                product: Some("Tea".to_string()),
                quantity: None,
                unit_price: Some("2.50".to_string()),
            }],
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "company_name": "ACME",
                "phone_number": null,
                "receipt_id": null,
                "items": [{"product": "Tea", "quantity": null, "unit_price": "2.50"}]
            })
        );
    }
}
