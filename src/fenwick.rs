//! Binary indexed (Fenwick) tree over occupancy counts.
//!
//! Each slot holds 0 or 1. The transcoder uses it to translate between
//! a position in the full string and a position among the slots that are
//! currently occupied.

#[derive(Debug, Clone)]
pub(crate) struct Fenwick {
	tree: Vec<usize>,
	most_significant_bit: u32,
}

impl Fenwick {
	/// Create an empty tree with `n` slots.
	pub(crate) fn new(n: usize) -> Self {
		Self {
			tree: vec![0; n + 1],
			most_significant_bit: (n + 1).ilog2(),
		}
	}

	/// Number of slots.
	pub(crate) fn len(&self) -> usize {
		self.tree.len() - 1
	}

	/// Increase slot `i` by one.
	pub(crate) fn increase(&mut self, i: usize) {
		let mut idx = i + 1;
		while idx < self.tree.len() {
			self.tree[idx] += 1;
			idx += lowest_bit(idx);
		}
	}

	/// Decrease slot `i` by one.
	pub(crate) fn decrease(&mut self, i: usize) {
		let mut idx = i + 1;
		while idx < self.tree.len() {
			self.tree[idx] -= 1;
			idx += lowest_bit(idx);
		}
	}

	/// Set every slot to one in linear time.
	pub(crate) fn fill(&mut self) {
		for idx in 1..self.tree.len() {
			self.tree[idx] += 1;
			let parent = idx + lowest_bit(idx);
			if parent < self.tree.len() {
				self.tree[parent] += self.tree[idx];
			}
		}
	}

	/// Sum of slots `0..=i`.
	pub(crate) fn prefix_sum(&self, i: usize) -> usize {
		let mut sum = 0;
		let mut idx = (i + 1).min(self.len());
		while idx > 0 {
			sum += self.tree[idx];
			idx -= lowest_bit(idx);
		}
		sum
	}

	/// Index of the slot at which the prefix sum first reaches `sum`.
	///
	/// With one-or-zero slots this is the position of the `sum`-th occupied
	/// slot (1-based). Returns `None` when fewer than `sum` slots are
	/// occupied or `sum` is zero.
	pub(crate) fn lower_bound(&self, mut sum: usize) -> Option<usize> {
		if sum == 0 {
			return None;
		}
		let mut idx = 0;
		let mut bitmask = 1usize << self.most_significant_bit;
		while bitmask > 0 {
			let current = idx | bitmask;
			bitmask >>= 1;
			if current < self.tree.len() && self.tree[current] < sum {
				idx = current;
				sum -= self.tree[current];
			}
		}
		if idx < self.len() {
			Some(idx)
		} else {
			None
		}
	}
}

fn lowest_bit(idx: usize) -> usize {
	idx & idx.wrapping_neg()
}
