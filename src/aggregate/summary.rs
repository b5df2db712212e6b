//! Cross-token summary and the two selection policies built on top of fetched holder sets.

// self
use crate::{
	_prelude::*,
	fetch::{HolderBalance, HolderSet},
	id::{Address, Mint},
};

/// Per-address view across every merged token.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AddressSummary {
	/// Distinct tokens the address holds.
	pub token_count: usize,
	/// Holding per token.
	pub holdings: BTreeMap<Mint, HolderBalance>,
	/// Sum of the valued holdings; unpriced tokens contribute nothing.
	pub total_value_usd: f64,
}

/// Address → [`AddressSummary`] map built incrementally from per-token holder sets.
///
/// Each `(address, token)` pair is merged at most once, so merging the same set twice leaves
/// the summary unchanged.
#[derive(Clone, Debug, Default)]
pub struct CrossTokenSummary {
	tokens: Vec<Mint>,
	entries: HashMap<Address, AddressSummary>,
	// First-seen order; keeps value ties deterministic.
	order: Vec<Address>,
}
impl CrossTokenSummary {
	/// Builds a summary from already fetched sets.
	pub fn from_sets<'a>(sets: impl IntoIterator<Item = &'a HolderSet>) -> Self {
		let mut summary = Self::default();

		for set in sets {
			summary.merge(set);
		}

		summary
	}

	/// Folds one token's holders into the summary.
	pub fn merge(&mut self, set: &HolderSet) {
		if self.tokens.contains(&set.mint) {
			return;
		}

		self.tokens.push(set.mint.clone());

		for holder in &set.holders {
			let order = &mut self.order;
			let entry = self.entries.entry(holder.address.clone()).or_insert_with(|| {
				order.push(holder.address.clone());

				AddressSummary::default()
			});

			entry.token_count += 1;
			entry.total_value_usd += holder.value_usd.unwrap_or(0.0);
			entry.holdings.insert(set.mint.clone(), holder.clone());
		}
	}

	/// Tokens merged so far, in merge order.
	pub fn tokens(&self) -> &[Mint] {
		&self.tokens
	}

	/// Number of distinct addresses seen.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` when no holder has been merged.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Looks up the summary of `address`.
	pub fn get(&self, address: &str) -> Option<&AddressSummary> {
		self.entries.get(address)
	}

	/// Applies the threshold policy: addresses holding at least `min_tokens` tokens, ranked by
	/// descending total value.
	pub fn qualify(&self, min_tokens: usize) -> ThresholdReport {
		let mut holders = self
			.order
			.iter()
			.filter_map(|address| {
				let summary = self.entries.get(address)?;

				(summary.token_count >= min_tokens).then(|| QualifiedHolder {
					address: address.clone(),
					token_count: summary.token_count,
					total_value_usd: summary.total_value_usd,
					holdings: summary.holdings.clone(),
				})
			})
			.collect::<Vec<_>>();

		holders.sort_by(|a, b| b.total_value_usd.total_cmp(&a.total_value_usd));

		ThresholdReport { tokens: self.tokens.clone(), min_tokens, holders }
	}
}

/// Address holding at least the requested number of tokens.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualifiedHolder {
	/// Holder address.
	pub address: Address,
	/// Distinct tokens held.
	pub token_count: usize,
	/// Total value across the held tokens.
	pub total_value_usd: f64,
	/// Holding per token.
	pub holdings: BTreeMap<Mint, HolderBalance>,
}

/// Output of the threshold policy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ThresholdReport {
	/// Requested tokens, in request order.
	pub tokens: Vec<Mint>,
	/// Minimum distinct-token count applied.
	pub min_tokens: usize,
	/// Qualified holders, highest total value first.
	pub holders: Vec<QualifiedHolder>,
}
impl ThresholdReport {
	/// Iterates qualified addresses in rank order.
	pub fn addresses(&self) -> impl Iterator<Item = &Address> {
		self.holders.iter().map(|holder| &holder.address)
	}
}

/// Address holding every requested token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommonHolder {
	/// Holder address.
	pub address: Address,
	/// Raw balance per token.
	pub holdings: BTreeMap<Mint, u64>,
}

/// Output of the intersection policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IntersectionReport {
	/// Requested tokens, in request order.
	pub tokens: Vec<Mint>,
	/// Addresses present in every token's holder set, in the first token's balance order.
	pub holders: Vec<CommonHolder>,
}
impl IntersectionReport {
	/// Iterates common addresses.
	pub fn addresses(&self) -> impl Iterator<Item = &Address> {
		self.holders.iter().map(|holder| &holder.address)
	}
}

/// Applies the intersection policy to already fetched sets.
///
/// The first set seeds the candidate list; each following set filters it down.
pub fn intersect(sets: &[HolderSet]) -> IntersectionReport {
	let tokens = sets.iter().map(|set| set.mint.clone()).collect();
	let Some((seed, rest)) = sets.split_first() else {
		return IntersectionReport { tokens, holders: Vec::new() };
	};
	let mut common = seed.addresses().collect::<Vec<_>>();

	for set in rest {
		common.retain(|address| set.contains(address));
	}

	let holders = common
		.into_iter()
		.map(|address| CommonHolder {
			address: address.clone(),
			holdings: sets
				.iter()
				.filter_map(|set| set.get(address).map(|holder| (set.mint.clone(), holder.balance)))
				.collect(),
		})
		.collect();

	IntersectionReport { tokens, holders }
}
