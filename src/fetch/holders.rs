//! Per-token holder balances and the accumulator that builds them page by page.

// self
use crate::{
	_prelude::*,
	id::{Address, Mint},
	rpc::AccountRecord,
};

/// Accumulated balance of one address for one token.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HolderBalance {
	/// Owning wallet.
	pub address: Address,
	/// Raw balance summed across every token account the wallet owns.
	pub balance: u64,
	/// `balance × unit price`, when a unit price was supplied.
	pub value_usd: Option<f64>,
}

/// Complete holder list for one token, sorted by descending balance.
///
/// Each address appears at most once and only with a nonzero balance. Tie order follows first
/// appearance in the upstream pages and carries no meaning.
#[derive(Clone, Debug, Serialize)]
pub struct HolderSet {
	/// Token the holders belong to.
	pub mint: Mint,
	/// Unit price used to value balances.
	pub unit_price_usd: Option<f64>,
	/// Holders, largest balance first.
	pub holders: Vec<HolderBalance>,
	/// Non-empty pages consumed.
	pub pages: u32,
	/// Token accounts seen across all pages.
	pub accounts: u64,
	/// Completion time of the fetch.
	#[serde(with = "time::serde::rfc3339")]
	pub fetched_at: OffsetDateTime,
	#[serde(skip)]
	index: HashMap<Address, usize>,
}
impl HolderSet {
	/// Builds a set from `(owner, amount)` pairs, summing repeated owners.
	///
	/// Useful for feeding already known balances into the aggregation policies.
	pub fn from_balances(
		mint: Mint,
		unit_price_usd: Option<f64>,
		balances: impl IntoIterator<Item = (Address, u64)>,
	) -> Self {
		let mut accumulator = HolderAccumulator::default();

		for (owner, amount) in balances {
			accumulator.add(owner, amount);
		}

		accumulator.finish(mint, unit_price_usd, 0)
	}

	/// Number of holders.
	pub fn len(&self) -> usize {
		self.holders.len()
	}

	/// Returns `true` when no address holds the token.
	pub fn is_empty(&self) -> bool {
		self.holders.is_empty()
	}

	/// Looks up the holding of `address`.
	pub fn get(&self, address: &str) -> Option<&HolderBalance> {
		self.index.get(address).and_then(|&idx| self.holders.get(idx))
	}

	/// Returns `true` when `address` holds the token.
	pub fn contains(&self, address: &str) -> bool {
		self.index.contains_key(address)
	}

	/// Iterates holder addresses, largest balance first.
	pub fn addresses(&self) -> impl Iterator<Item = &Address> {
		self.holders.iter().map(|holder| &holder.address)
	}
}

/// Running per-owner totals for one token fetch.
#[derive(Debug, Default)]
pub(crate) struct HolderAccumulator {
	balances: HashMap<Address, u64>,
	order: Vec<Address>,
	accounts: u64,
}
impl HolderAccumulator {
	pub(crate) fn extend(&mut self, records: &[AccountRecord]) {
		for record in records {
			self.add(record.owner.clone(), record.amount);
		}
	}

	pub(crate) fn add(&mut self, owner: Address, amount: u64) {
		self.accounts += 1;

		match self.balances.get_mut(&owner) {
			Some(balance) => *balance = balance.saturating_add(amount),
			None => {
				self.order.push(owner.clone());
				self.balances.insert(owner, amount);
			},
		}
	}

	pub(crate) fn finish(self, mint: Mint, unit_price_usd: Option<f64>, pages: u32) -> HolderSet {
		let Self { mut balances, order, accounts } = self;
		let mut holders = order
			.into_iter()
			.filter_map(|address| {
				let balance = balances.remove(&address)?;

				(balance > 0).then(|| HolderBalance {
					value_usd: unit_price_usd.map(|price| balance as f64 * price),
					address,
					balance,
				})
			})
			.collect::<Vec<_>>();

		holders.sort_by(|a, b| b.balance.cmp(&a.balance));

		let index = holders
			.iter()
			.enumerate()
			.map(|(idx, holder)| (holder.address.clone(), idx))
			.collect();

		HolderSet {
			mint,
			unit_price_usd,
			holders,
			pages,
			accounts,
			fetched_at: OffsetDateTime::now_utc(),
			index,
		}
	}
}
