//! Line-item pairing: attach quantity and unit-price boxes to each product
//! box on the same visual row.
use crate::detection::Detection;
use crate::overlap::vertical_iou;

/// One receipt row. Quantity and unit price are absent when nothing overlaps
/// the product vertically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineItem<'a> {
    pub product: &'a Detection,
    pub quantity: Option<&'a Detection>,
    pub unit_price: Option<&'a Detection>,
}

fn sorted_by_mid_y<'a>(detections: &[&'a Detection]) -> Vec<&'a Detection> {
    let mut sorted = detections.to_vec();
    sorted.sort_by(|a, b| a.bbox.mid_y().total_cmp(&b.bbox.mid_y()));
    sorted
}

/// Best vertical match for `product`. Only a strictly higher score replaces
/// the current best, so ties keep the topmost candidate and a best score of
/// zero leaves the slot empty.
fn best_match<'a>(product: &Detection, candidates: &[&'a Detection]) -> Option<&'a Detection> {
    let mut best = None;
    let mut best_score = 0.0f32;
    for candidate in candidates {
        let score = vertical_iou(&product.bbox, &candidate.bbox);
        if score > best_score {
            best_score = score;
            best = Some(*candidate);
        }
    }
    best
}

/// Pairs every product with its best quantity and unit price, top to bottom.
///
/// Matching is greedy per product: two products may select the same
/// quantity or price box.
pub fn pair_line_items<'a>(
    products: &[&'a Detection],
    quantities: &[&'a Detection],
    unit_prices: &[&'a Detection],
) -> Vec<LineItem<'a>> {
    let quantities = sorted_by_mid_y(quantities);
    let unit_prices = sorted_by_mid_y(unit_prices);

    sorted_by_mid_y(products)
        .into_iter()
        .map(|product| LineItem {
            product,
            quantity: best_match(product, &quantities),
            unit_price: best_match(product, &unit_prices),
        })
        .collect()
}
