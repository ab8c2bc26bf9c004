use std::ops::AddAssign;

/// Order was priced outside the book window; it was accepted as zero volume.
pub const FLAG_PRICE_OUT_OF_RANGE: u8 = 1 << 0;

/// Result of processing one order.
///
/// `exec_price` is the last price any fill happened at (0 without
/// execution). `filled_volume` carries the order's own sign. `revenue` is
/// `-Σ fill_i · price_i`: negative for a buy, positive for a sell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderOutcome {
    pub exec_price: u32,
    pub filled_volume: i64,
    pub revenue: i64,
    pub flags: u8,
}

impl OrderOutcome {
    /// True when the order priced outside the window.
    #[inline]
    pub fn out_of_range(&self) -> bool {
        self.flags & FLAG_PRICE_OUT_OF_RANGE != 0
    }
}

/// Component-wise accumulation. The dispatch path runs one real handler and
/// two zero-volume dummies per order, then folds the three partial outcomes
/// into one; at most one summand has non-zero fields.
impl AddAssign for OrderOutcome {
    fn add_assign(&mut self, rhs: Self) {
        self.exec_price += rhs.exec_price;
        self.filled_volume += rhs.filled_volume;
        self.revenue += rhs.revenue;
        self.flags |= rhs.flags;
    }
}
