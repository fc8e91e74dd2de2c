//! Association rule mining over co-occurrence transactions
//!
//! Frequent itemsets are found level by level (Apriori): a `k`-itemset is only
//! counted when every `k-1` subset is already frequent. Rules are derived from
//! every frequent itemset of two or more items by splitting it into a
//! non-empty antecedent and consequent.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::domain::product::ProductId;
use crate::errors::DomainError;

use super::types::{
    AssociationRule, FrequentItemset, MinerThresholds, RecommendationMetric, RuleRecommendation,
    Transaction, MAX_ITEMSET_SIZE,
};

/// Itemsets are kept as sorted vectors so candidate generation can join on
/// shared prefixes.
type Itemset = Vec<ProductId>;

#[derive(Debug, Clone)]
pub struct AssociationRulesMiner {
    thresholds: MinerThresholds,
    transaction_count: usize,
    itemsets: BTreeMap<Itemset, usize>,
    rules: Vec<AssociationRule>,
    fitted: bool,
}

impl AssociationRulesMiner {
    pub fn new(thresholds: MinerThresholds) -> Result<Self, DomainError> {
        thresholds.validate()?;
        Ok(Self {
            thresholds,
            transaction_count: 0,
            itemsets: BTreeMap::new(),
            rules: Vec::new(),
            fitted: false,
        })
    }

    pub fn thresholds(&self) -> &MinerThresholds {
        &self.thresholds
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Number of non-empty transactions seen by the last `fit`.
    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    /// Mines frequent itemsets and rules, replacing any earlier state.
    /// Returns the number of rules kept.
    pub fn fit(&mut self, transactions: &[Transaction]) -> Result<usize, DomainError> {
        if let Some(index) = transactions
            .iter()
            .position(|transaction| transaction.iter().any(|id| id.as_str().trim().is_empty()))
        {
            return Err(DomainError::InvalidInput(format!(
                "transaction {index} contains an empty product id"
            )));
        }

        let baskets: Vec<&Transaction> =
            transactions.iter().filter(|transaction| !transaction.is_empty()).collect();

        self.transaction_count = baskets.len();
        self.itemsets = self.frequent_counts(&baskets);
        self.rules = self.derive_rules();
        self.fitted = true;

        debug!(
            event_name = "recommend.rules.fitted",
            transactions = self.transaction_count,
            itemsets = self.itemsets.len(),
            rules = self.rules.len(),
            "association rules mined"
        );
        Ok(self.rules.len())
    }

    /// Rules ordered by lift, then confidence, then support (all descending).
    pub fn rules(&self) -> &[AssociationRule] {
        &self.rules
    }

    pub fn frequent_itemsets(&self) -> Vec<FrequentItemset> {
        self.itemsets
            .iter()
            .map(|(items, count)| FrequentItemset {
                items: items.iter().cloned().collect(),
                support: self.support_of(*count),
            })
            .collect()
    }

    /// Rules mentioning `product_id` on either side.
    pub fn rules_for_product(&self, product_id: &ProductId) -> Vec<&AssociationRule> {
        self.rules.iter().filter(|rule| rule.involves(product_id)).collect()
    }

    /// Recommendations for `basket` ranked by lift.
    pub fn get_product_recommendations(
        &self,
        basket: &[ProductId],
        top_n: Option<usize>,
    ) -> Vec<RuleRecommendation> {
        self.get_product_recommendations_by(basket, top_n, RecommendationMetric::Lift)
    }

    /// Consequent products of every rule whose antecedent is contained in
    /// `basket`. Basket items are never recommended; each product appears once
    /// with its best score.
    pub fn get_product_recommendations_by(
        &self,
        basket: &[ProductId],
        top_n: Option<usize>,
        metric: RecommendationMetric,
    ) -> Vec<RuleRecommendation> {
        let basket: BTreeSet<&ProductId> = basket.iter().collect();
        if basket.is_empty() {
            return Vec::new();
        }

        let mut best: BTreeMap<ProductId, RuleRecommendation> = BTreeMap::new();
        for rule in &self.rules {
            if !rule.antecedent.iter().all(|id| basket.contains(id)) {
                continue;
            }
            let score = match metric {
                RecommendationMetric::Lift => rule.lift,
                RecommendationMetric::Confidence => rule.confidence,
            };
            for product in rule.consequent.iter().filter(|id| !basket.contains(id)) {
                let candidate = RuleRecommendation {
                    product: product.clone(),
                    score,
                    support: rule.support,
                    confidence: rule.confidence,
                    lift: rule.lift,
                    antecedent: rule.antecedent.clone(),
                };
                match best.get(product) {
                    Some(existing) if existing.score >= score => {}
                    _ => {
                        best.insert(product.clone(), candidate);
                    }
                }
            }
        }

        let mut recommendations: Vec<RuleRecommendation> = best.into_values().collect();
        recommendations
            .sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.product.cmp(&b.product)));
        if let Some(limit) = top_n {
            recommendations.truncate(limit);
        }
        recommendations
    }

    fn support_of(&self, count: usize) -> f64 {
        if self.transaction_count == 0 {
            0.0
        } else {
            count as f64 / self.transaction_count as f64
        }
    }

    fn is_frequent(&self, count: usize) -> bool {
        count > 0 && self.support_of(count) >= self.thresholds.min_support
    }

    fn frequent_counts(&self, baskets: &[&Transaction]) -> BTreeMap<Itemset, usize> {
        let mut frequent = BTreeMap::new();
        if baskets.is_empty() {
            return frequent;
        }

        let mut singles: BTreeMap<&ProductId, usize> = BTreeMap::new();
        for basket in baskets {
            for id in basket.iter() {
                *singles.entry(id).or_default() += 1;
            }
        }
        let mut level: BTreeMap<Itemset, usize> = singles
            .into_iter()
            .filter(|(_, count)| self.is_frequent(*count))
            .map(|(id, count)| (vec![id.clone()], count))
            .collect();

        let longest = baskets.iter().map(|basket| basket.len()).max().unwrap_or(0);
        let limit = self
            .thresholds
            .max_itemset_size
            .unwrap_or(MAX_ITEMSET_SIZE)
            .min(MAX_ITEMSET_SIZE)
            .min(longest);

        let mut size = 1;
        while !level.is_empty() {
            frequent.extend(level.iter().map(|(items, count)| (items.clone(), *count)));
            size += 1;
            if size > limit {
                break;
            }

            let candidates = generate_candidates(&level);
            level = candidates
                .into_iter()
                .filter_map(|candidate| {
                    let count = baskets
                        .iter()
                        .filter(|basket| candidate.iter().all(|id| basket.contains(id)))
                        .count();
                    self.is_frequent(count).then_some((candidate, count))
                })
                .collect();
        }

        frequent
    }

    fn derive_rules(&self) -> Vec<AssociationRule> {
        let mut rules = Vec::new();

        for (items, count) in self.itemsets.iter().filter(|(items, _)| items.len() >= 2) {
            if items.len() > MAX_ITEMSET_SIZE {
                continue;
            }
            let support = self.support_of(*count);
            let full_mask: u32 = (1 << items.len()) - 1;

            for mask in 1..full_mask {
                let (antecedent, consequent) = split_by_mask(items, mask);
                // Every subset of a frequent itemset is frequent, so both lookups hit.
                let (Some(antecedent_count), Some(consequent_count)) =
                    (self.itemsets.get(&antecedent), self.itemsets.get(&consequent))
                else {
                    continue;
                };

                let confidence = *count as f64 / *antecedent_count as f64;
                let consequent_support = self.support_of(*consequent_count);
                if consequent_support <= 0.0 {
                    continue;
                }
                let lift = confidence / consequent_support;

                let kept = confidence >= self.thresholds.min_confidence
                    && lift >= self.thresholds.min_lift;
                if kept {
                    rules.push(AssociationRule {
                        antecedent: antecedent.into_iter().collect(),
                        consequent: consequent.into_iter().collect(),
                        support,
                        confidence,
                        lift,
                    });
                }
            }
        }

        rules.sort_by(|a, b| {
            b.lift
                .total_cmp(&a.lift)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
                .then_with(|| b.support.total_cmp(&a.support))
                .then_with(|| a.antecedent.cmp(&b.antecedent))
                .then_with(|| a.consequent.cmp(&b.consequent))
        });
        rules
    }
}

impl Default for AssociationRulesMiner {
    fn default() -> Self {
        Self {
            thresholds: MinerThresholds::default(),
            transaction_count: 0,
            itemsets: BTreeMap::new(),
            rules: Vec::new(),
            fitted: false,
        }
    }
}

/// Joins `k-1` itemsets that share their first `k-2` items, then drops any
/// candidate with an infrequent `k-1` subset.
fn generate_candidates(level: &BTreeMap<Itemset, usize>) -> BTreeSet<Itemset> {
    let itemsets: Vec<&Itemset> = level.keys().collect();
    let mut candidates = BTreeSet::new();

    for (index, left) in itemsets.iter().enumerate() {
        let prefix = &left[..left.len() - 1];
        for right in itemsets[index + 1..].iter() {
            if &right[..right.len() - 1] != prefix {
                // Sorted keys: once the prefix differs no later set shares it.
                break;
            }
            let mut candidate = (*left).clone();
            candidate.push(right[right.len() - 1].clone());

            let all_subsets_frequent = (0..candidate.len()).all(|skip| {
                let subset: Itemset = candidate
                    .iter()
                    .enumerate()
                    .filter(|(position, _)| *position != skip)
                    .map(|(_, id)| id.clone())
                    .collect();
                level.contains_key(&subset)
            });
            if all_subsets_frequent {
                candidates.insert(candidate);
            }
        }
    }

    candidates
}

fn split_by_mask(items: &[ProductId], mask: u32) -> (Itemset, Itemset) {
    let mut antecedent = Vec::new();
    let mut consequent = Vec::new();
    for (position, id) in items.iter().enumerate() {
        if mask & (1 << position) != 0 {
            antecedent.push(id.clone());
        } else {
            consequent.push(id.clone());
        }
    }
    (antecedent, consequent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::types::DEFAULT_MAX_ITEMSET_SIZE;

    fn basket(ids: &[&str]) -> Transaction {
        ids.iter().map(|id| ProductId::from(*id)).collect()
    }

    fn orders() -> Vec<Transaction> {
        vec![
            basket(&["phone", "case", "charger"]),
            basket(&["phone", "case"]),
            basket(&["phone", "charger"]),
            basket(&["case", "strap"]),
            basket(&["laptop", "mouse"]),
            basket(&["laptop", "mouse", "sleeve"]),
            basket(&["phone", "case"]),
            basket(&["mouse"]),
        ]
    }

    fn miner(min_support: f64, min_confidence: f64, min_lift: f64) -> AssociationRulesMiner {
        AssociationRulesMiner::new(MinerThresholds::new(min_support, min_confidence, min_lift))
            .expect("valid thresholds")
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let error = AssociationRulesMiner::new(MinerThresholds::new(2.0, 0.1, 1.0))
            .expect_err("support above one must fail");
        assert!(matches!(error, DomainError::InvalidConfig(_)));
    }

    #[test]
    fn fit_computes_support_confidence_and_lift() {
        let mut miner = miner(0.2, 0.5, 1.0);
        miner.fit(&orders()).expect("fits");

        let rule = miner
            .rules()
            .iter()
            .find(|rule| {
                rule.antecedent == basket(&["laptop"]) && rule.consequent == basket(&["mouse"])
            })
            .expect("laptop -> mouse");

        // laptop in 2/8, mouse in 3/8, both in 2/8
        assert!((rule.support - 0.25).abs() < 1e-12);
        assert!((rule.confidence - 1.0).abs() < 1e-12);
        assert!((rule.lift - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn every_rule_satisfies_the_thresholds() {
        let thresholds = MinerThresholds::new(0.2, 0.6, 1.1);
        let mut miner = AssociationRulesMiner::new(thresholds).expect("valid");
        miner.fit(&orders()).expect("fits");

        assert!(!miner.rules().is_empty());
        for rule in miner.rules() {
            assert!(rule.support >= thresholds.min_support);
            assert!(rule.confidence >= thresholds.min_confidence);
            assert!(rule.lift >= thresholds.min_lift);
            assert!(rule.antecedent.is_disjoint(&rule.consequent));
        }
    }

    #[test]
    fn rules_are_sorted_by_lift_descending() {
        let mut miner = miner(0.1, 0.1, 0.0);
        miner.fit(&orders()).expect("fits");

        let lifts: Vec<f64> = miner.rules().iter().map(|rule| rule.lift).collect();
        assert!(lifts.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn looser_thresholds_never_yield_fewer_rules() {
        let mut loose = miner(0.1, 0.2, 1.0);
        let mut strict = miner(0.4, 0.6, 1.5);

        let loose_count = loose.fit(&orders()).expect("fits");
        let strict_count = strict.fit(&orders()).expect("fits");
        assert!(loose_count >= strict_count);
    }

    #[test]
    fn three_item_itemsets_are_found() {
        let mut miner = miner(0.1, 0.1, 0.0);
        miner.fit(&orders()).expect("fits");

        assert!(miner
            .frequent_itemsets()
            .iter()
            .any(|itemset| itemset.items == basket(&["case", "charger", "phone"])));
    }

    #[test]
    fn max_itemset_size_caps_mining() {
        let thresholds =
            MinerThresholds { max_itemset_size: Some(2), ..MinerThresholds::new(0.1, 0.1, 0.0) };
        let mut miner = AssociationRulesMiner::new(thresholds).expect("valid");
        miner.fit(&orders()).expect("fits");

        assert!(miner.frequent_itemsets().iter().all(|itemset| itemset.items.len() <= 2));
    }

    #[test]
    fn large_orders_are_mined_up_to_the_default_cap() {
        let mut transactions: Vec<Transaction> = (0..20)
            .map(|index| basket(&[&format!("sku-{index}"), &format!("sku-{}", (index + 1) % 20)]))
            .collect();
        let wholesale: Vec<String> = (0..20).map(|index| format!("sku-{index}")).collect();
        let wholesale: Vec<&str> = wholesale.iter().map(String::as_str).collect();
        transactions.push(basket(&wholesale));

        let mut miner = AssociationRulesMiner::default();
        let rules = miner.fit(&transactions).expect("fits");

        assert!(rules > 0);
        let longest = miner.frequent_itemsets().iter().map(|itemset| itemset.items.len()).max();
        assert_eq!(longest, Some(DEFAULT_MAX_ITEMSET_SIZE));
        assert!(miner
            .rules()
            .iter()
            .all(|rule| rule.antecedent.len() + rule.consequent.len() <= DEFAULT_MAX_ITEMSET_SIZE));
    }

    #[test]
    fn recommendations_exclude_basket_items() {
        let mut miner = miner(0.1, 0.1, 0.0);
        miner.fit(&orders()).expect("fits");

        let basket = vec![ProductId::from("phone"), ProductId::from("case")];
        let recommendations = miner.get_product_recommendations(&basket, None);

        assert!(!recommendations.is_empty());
        assert!(recommendations.iter().all(|rec| !basket.contains(&rec.product)));
        let unique: BTreeSet<_> = recommendations.iter().map(|rec| &rec.product).collect();
        assert_eq!(unique.len(), recommendations.len());
    }

    #[test]
    fn recommendations_rank_by_requested_metric() {
        let mut miner = miner(0.1, 0.1, 0.0);
        miner.fit(&orders()).expect("fits");

        let by_confidence = miner.get_product_recommendations_by(
            &[ProductId::from("laptop")],
            Some(1),
            RecommendationMetric::Confidence,
        );
        assert_eq!(by_confidence.len(), 1);
        assert_eq!(by_confidence[0].product, ProductId::from("mouse"));
        assert!((by_confidence[0].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unfitted_or_empty_input_yields_nothing() {
        let mut miner = AssociationRulesMiner::default();
        assert!(!miner.is_fitted());
        assert!(miner.get_product_recommendations(&[ProductId::from("phone")], None).is_empty());

        assert_eq!(miner.fit(&[]).expect("empty input is fine"), 0);
        assert!(miner.is_fitted());
        assert!(miner.get_product_recommendations(&[], None).is_empty());
    }

    #[test]
    fn empty_product_ids_are_rejected() {
        let mut miner = AssociationRulesMiner::default();
        let error = miner.fit(&[basket(&["phone", " "])]).expect_err("blank id must fail");
        assert!(matches!(error, DomainError::InvalidInput(_)));
    }

    #[test]
    fn rules_for_product_matches_either_side() {
        let mut miner = miner(0.2, 0.5, 1.0);
        miner.fit(&orders()).expect("fits");

        let sleeve = ProductId::from("mouse");
        let related = miner.rules_for_product(&sleeve);
        assert!(!related.is_empty());
        assert!(related.iter().all(|rule| rule.involves(&sleeve)));
    }
}
