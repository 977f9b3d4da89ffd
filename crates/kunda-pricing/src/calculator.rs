//! # Transfer Calculator — Send/Receive Pricing
//!
//! Prices a transfer from either end: the sender names the amount they
//! pay, or the amount the recipient should get.
//!
//! ## Algorithm
//!
//! 1. Reject non-positive principals and rails that cannot pay.
//! 2. Resolve the exchange rate and the base fee fraction `f` through the
//!    configured sources.
//! 3. Apply a promo code to `f` (percentage or fixed), clamped at zero.
//! 4. Ask the loyalty service for a discount `L` (origin currency) on
//!    corridors out of Gabon. `L` comes off the fee amount, floored at zero.
//! 5. Send given `P`: `fee = max(0, P·f − L)`, `receive = (P − fee)·rate`.
//!    Receive given `R`: `S = (R/rate − L)/(1 − f)` while `S·f ≥ L`,
//!    otherwise the fee is fully absorbed and `S = R/rate`.
//! 6. Optional cash-out fee `W` on Gabonese mobile money: receive given adds
//!    `W/rate` to the send amount; send given takes `W` off the receive
//!    amount.
//! 7. Round: XAF paid amounts up to 5, XAF received amounts down to 5,
//!    everything else to cents; the rate to 4 decimals.
//!
//! The calculator is stateless; every collaborator sits behind an `Arc` and
//! is only read.

use std::sync::Arc;

use kunda_core::currency::{round_cents, round_places};
use kunda_core::{Corridor, Currency, PromoCodeId, Rail, RailPair, UserId};
use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::loyalty::{self, InMemoryLoyaltyLedger, LoyaltyDiscount, LoyaltyService};
use crate::promo::{apply_promo, InMemoryPromoBook, PromoValidator};
use crate::source::{FeeKey, FeeSource, RateSource};
use crate::tables::StaticTables;
use crate::withdrawal::{WithdrawalFee, WithdrawalFeeLine, WithdrawalSchedule};

/// Which end of the transfer the principal names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSide {
    /// The amount the sender pays, in the origin currency.
    Send,
    /// The amount the recipient gets, in the destination currency.
    Receive,
}

/// Input to [`TransferCalculator::quote`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    /// Principal.
    pub amount: f64,
    /// Which end `amount` names.
    pub side: AmountSide,
    /// Route.
    pub corridor: Corridor,
    /// Payment and receiving rails.
    pub rails: RailPair,
    /// Promo code as typed by the user.
    pub promo_code: Option<String>,
    /// Have the sender cover the recipient's cash-out fee.
    pub include_withdrawal_fee: bool,
    /// Loyalty points the user wants to spend.
    pub loyalty_points: u32,
    /// The sending user, when known.
    pub user: Option<UserId>,
}

impl QuoteRequest {
    /// A request with no promo, no loyalty and no withdrawal fee.
    pub fn new(amount: f64, side: AmountSide, corridor: Corridor, rails: RailPair) -> Self {
        Self {
            amount,
            side,
            corridor,
            rails,
            promo_code: None,
            include_withdrawal_fee: false,
            loyalty_points: 0,
            user: None,
        }
    }

    /// The sender pays `amount`.
    pub fn send(amount: f64, corridor: Corridor, rails: RailPair) -> Self {
        Self::new(amount, AmountSide::Send, corridor, rails)
    }

    /// The recipient gets `amount`.
    pub fn receive(amount: f64, corridor: Corridor, rails: RailPair) -> Self {
        Self::new(amount, AmountSide::Receive, corridor, rails)
    }

    /// Attach a promo code.
    pub fn with_promo_code(mut self, code: impl Into<String>) -> Self {
        self.promo_code = Some(code.into());
        self
    }

    /// Cover the recipient's cash-out fee.
    pub fn with_withdrawal_fee(mut self, include: bool) -> Self {
        self.include_withdrawal_fee = include;
        self
    }

    /// Identify the sender.
    pub fn for_user(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    /// Spend loyalty points (requires [`for_user`](Self::for_user)).
    pub fn with_loyalty_points(mut self, points: u32) -> Self {
        self.loyalty_points = points;
        self
    }
}

/// A priced transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferQuote {
    /// Route.
    pub corridor: Corridor,
    /// Rail the sender pays with.
    pub payment_method: Rail,
    /// Rail the recipient is paid on.
    pub receiving_method: Rail,
    /// Origin currency.
    pub sender_currency: Currency,
    /// Destination currency.
    pub receiver_currency: Currency,
    /// What the sender pays, fees included.
    pub amount_sent: f64,
    /// What the recipient gets, net of any cash-out fee.
    pub amount_received: f64,
    /// Platform fee after promo and loyalty, origin currency.
    pub platform_fee: f64,
    /// Cash-out fee, destination currency.
    pub withdrawal_fee: f64,
    /// Cash-out fee converted to the origin currency.
    pub withdrawal_fee_in_sender_currency: f64,
    /// Breakdown of the cash-out fee.
    pub withdrawal_fee_lines: Vec<WithdrawalFeeLine>,
    /// Platform fee plus converted cash-out fee, origin currency.
    pub total_fees: f64,
    /// Destination units per origin unit.
    pub exchange_rate: f64,
    /// Fee fraction before the promo.
    pub original_fee_percentage: f64,
    /// Fee fraction after the promo, before loyalty.
    pub effective_fee_percentage: f64,
    /// Promo code applied, if any.
    pub promo_code_id: Option<PromoCodeId>,
    /// Whether a cash-out fee was priced in.
    pub include_withdrawal_fee: bool,
    /// Loyalty discount, origin currency.
    pub loyalty_discount: f64,
    /// Loyalty points spent.
    pub loyalty_points_used: u32,
    /// Balance after spending; `None` when loyalty was not consulted.
    pub remaining_loyalty_points: Option<u32>,
}

/// Prices transfers from the configured sources.
#[derive(Clone)]
pub struct TransferCalculator {
    rates: Arc<dyn RateSource>,
    fees: Arc<dyn FeeSource>,
    promos: Arc<dyn PromoValidator>,
    loyalty: Arc<dyn LoyaltyService>,
}

impl std::fmt::Debug for TransferCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferCalculator")
            .field("rates", &self.rates.source_name())
            .field("fees", &self.fees.source_name())
            .finish_non_exhaustive()
    }
}

impl TransferCalculator {
    /// A calculator over `rates` and `fees`, with no promo codes and no
    /// loyalty balances.
    pub fn new(rates: Arc<dyn RateSource>, fees: Arc<dyn FeeSource>) -> Self {
        let loyalty = Arc::new(InMemoryLoyaltyLedger::new(rates.clone()));
        Self {
            rates,
            fees,
            promos: Arc::new(InMemoryPromoBook::new()),
            loyalty,
        }
    }

    /// A calculator over the built-in tables only.
    pub fn with_static_tables() -> Self {
        let tables = Arc::new(StaticTables::defaults());
        Self::new(tables.clone(), tables)
    }

    /// Validate promo codes with `promos`.
    pub fn with_promo_validator(mut self, promos: Arc<dyn PromoValidator>) -> Self {
        self.promos = promos;
        self
    }

    /// Price loyalty points with `loyalty`.
    pub fn with_loyalty_service(mut self, loyalty: Arc<dyn LoyaltyService>) -> Self {
        self.loyalty = loyalty;
        self
    }

    /// Exchange rate for a currency pair. A currency converts to itself at 1.
    pub fn exchange_rate(&self, from: Currency, to: Currency) -> Result<f64, PricingError> {
        if from == to {
            return Ok(1.0);
        }
        let rate = self.rates.rate(from, to).unwrap_or_else(|e| {
            tracing::warn!(%from, %to, error = %e, "rate lookup failed");
            None
        });
        match rate {
            Some(r) if r.is_finite() && r > 0.0 => {
                tracing::debug!(%from, %to, rate = r, source = self.rates.source_name(), "rate resolved");
                Ok(r)
            }
            Some(r) => {
                tracing::warn!(%from, %to, rate = r, "ignoring non-positive rate");
                Err(PricingError::RateUnavailable { from, to })
            }
            None => Err(PricingError::RateUnavailable { from, to }),
        }
    }

    /// Base fee fraction for a corridor and rail pair.
    pub fn fee_percentage(&self, key: &FeeKey) -> Result<f64, PricingError> {
        let fee = self.fees.fee_percentage(key).unwrap_or_else(|e| {
            tracing::warn!(key = %key, error = %e, "fee lookup failed");
            None
        });
        let Some(fee) = fee else {
            return Err(PricingError::FeeUnavailable {
                corridor: key.corridor,
                rails: key.rails,
            });
        };
        if !fee.is_finite() || !(0.0..1.0).contains(&fee) {
            return Err(PricingError::InvalidFeeConfiguration {
                corridor: key.corridor,
                fee_percentage: fee,
            });
        }
        tracing::debug!(key = %key, fee_percentage = fee, source = self.fees.source_name(), "fee resolved");
        Ok(fee)
    }

    /// Price a transfer.
    pub fn quote(&self, req: &QuoteRequest) -> Result<TransferQuote, PricingError> {
        if !req.amount.is_finite() || req.amount <= 0.0 {
            return Err(PricingError::InvalidAmount(req.amount));
        }
        let corridor = req.corridor;
        if !req.rails.payment.can_pay() || !req.rails.receiving.can_receive() {
            return Err(PricingError::RailNotAllowed {
                corridor,
                rails: req.rails,
            });
        }

        let from = corridor.origin_currency();
        let to = corridor.destination_currency();
        let rate = self.exchange_rate(from, to)?;
        let base_fee = self.fee_percentage(&FeeKey::new(corridor, req.rails))?;

        let send_principal = match req.side {
            AmountSide::Send => req.amount,
            AmountSide::Receive => req.amount / rate,
        };

        let mut fee_pct = base_fee;
        let mut promo_code_id = None;
        if let Some(code) = req
            .promo_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let grant = self.promos.validate(code, corridor, req.user)?;
            fee_pct = apply_promo(base_fee, &grant, send_principal);
            promo_code_id = Some(grant.promo_code_id);
            tracing::debug!(code, base_fee, fee_pct, "promo applied");
        }

        let loyalty = self.loyalty_discount(req, send_principal, from)?;
        let discount = loyalty.map_or(0.0, |d| d.discount_amount);

        let (mut sent, mut received) = match req.side {
            AmountSide::Send => {
                let fee = (req.amount * fee_pct - discount).max(0.0);
                (req.amount, (req.amount - fee) * rate)
            }
            AmountSide::Receive => (
                solve_send_amount(req.amount, rate, fee_pct, discount),
                req.amount,
            ),
        };
        let platform_fee = (sent * fee_pct - discount).max(0.0);

        let withdrawal = self.withdrawal_fee(req, received);
        if let Some(w) = &withdrawal {
            match req.side {
                AmountSide::Receive => sent += w.total / rate,
                AmountSide::Send => received = (received - w.total).max(0.0),
            }
        }
        let withdrawal = withdrawal.unwrap_or_default();
        let include_withdrawal_fee = !withdrawal.lines.is_empty();
        let withdrawal_in_sender = withdrawal.total / rate;

        let quote = TransferQuote {
            corridor,
            payment_method: req.rails.payment,
            receiving_method: req.rails.receiving,
            sender_currency: from,
            receiver_currency: to,
            amount_sent: from.round_origin(sent),
            amount_received: to.round_destination(received),
            platform_fee: from.round_origin(platform_fee),
            withdrawal_fee: to.round_origin(withdrawal.total),
            withdrawal_fee_in_sender_currency: from.round_origin(withdrawal_in_sender),
            withdrawal_fee_lines: withdrawal.lines,
            total_fees: from.round_origin(platform_fee + withdrawal_in_sender),
            exchange_rate: round_places(rate, 4),
            original_fee_percentage: base_fee,
            effective_fee_percentage: fee_pct,
            promo_code_id,
            include_withdrawal_fee,
            loyalty_discount: round_cents(discount),
            loyalty_points_used: loyalty.map_or(0, |d| d.points_used),
            remaining_loyalty_points: loyalty.map(|d| d.remaining_points),
        };

        tracing::info!(
            corridor = %corridor,
            rails = %req.rails,
            side = ?req.side,
            amount_sent = quote.amount_sent,
            amount_received = quote.amount_received,
            total_fees = quote.total_fees,
            "quote computed"
        );
        Ok(quote)
    }

    fn loyalty_discount(
        &self,
        req: &QuoteRequest,
        send_principal: f64,
        currency: Currency,
    ) -> Result<Option<LoyaltyDiscount>, PricingError> {
        let Some(user) = req.user else {
            return Ok(None);
        };
        if req.loyalty_points == 0 {
            return Ok(None);
        }
        if !loyalty::is_eligible(req.corridor) {
            tracing::debug!(corridor = %req.corridor, "corridor does not accept loyalty points");
            return Ok(None);
        }
        let d = self
            .loyalty
            .discount(user, req.loyalty_points, send_principal, currency)?;
        Ok(Some(d))
    }

    fn withdrawal_fee(&self, req: &QuoteRequest, received: f64) -> Option<WithdrawalFee> {
        if !req.include_withdrawal_fee {
            return None;
        }
        match WithdrawalSchedule::for_transfer(req.corridor, req.rails.receiving) {
            Some(schedule) => Some(schedule.compute(received)),
            None => {
                tracing::debug!(
                    corridor = %req.corridor,
                    rail = %req.rails.receiving,
                    "no cash-out fee for this payout"
                );
                None
            }
        }
    }
}

/// Send amount that delivers `receive` after fee fraction `fee_pct` and an
/// absolute fee discount `discount`.
fn solve_send_amount(receive: f64, rate: f64, fee_pct: f64, discount: f64) -> f64 {
    let net = receive / rate;
    let gross = (net - discount) / (1.0 - fee_pct);
    if gross * fee_pct >= discount {
        gross
    } else {
        net
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promo::{DiscountType, PromoCode, PromoError};
    use crate::tables::FeeEntry;
    use chrono::{Duration, Utc};
    use kunda_core::Country;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn corridor(o: Country, d: Country) -> Corridor {
        Corridor::new(o, d).unwrap()
    }

    fn rails(p: Rail, r: Rail) -> RailPair {
        RailPair::new(p, r).unwrap()
    }

    fn fr_ga_card_airtel(amount: f64, side: AmountSide) -> QuoteRequest {
        QuoteRequest::new(
            amount,
            side,
            corridor(Country::FR, Country::GA),
            rails(Rail::Card, Rail::AirtelMoney),
        )
    }

    fn promo(text: &str, direction: Corridor, kind: DiscountType, value: f64) -> PromoCode {
        PromoCode {
            id: PromoCodeId::new(),
            code: text.into(),
            direction,
            discount_type: kind,
            discount_value: value,
            start_date: Utc::now() - Duration::days(1),
            end_date: Utc::now() + Duration::days(30),
            max_uses: None,
            current_uses: 0,
            active: true,
            user_id: None,
        }
    }

    fn with_promos(codes: Vec<PromoCode>) -> TransferCalculator {
        let mut book = InMemoryPromoBook::new();
        for c in codes {
            book.insert(c).unwrap();
        }
        TransferCalculator::with_static_tables().with_promo_validator(Arc::new(book))
    }

    #[test]
    fn hundred_euros_to_gabon() {
        let q = TransferCalculator::with_static_tables()
            .quote(&fr_ga_card_airtel(100.0, AmountSide::Send))
            .unwrap();
        assert!(close(q.platform_fee, 0.60));
        assert!(close(q.total_fees, 0.60));
        assert_eq!(q.amount_received, 65_200.0);
        assert_eq!(q.amount_sent, 100.0);
        assert_eq!(q.exchange_rate, 655.96);
        assert_eq!(q.sender_currency, Currency::Eur);
        assert_eq!(q.receiver_currency, Currency::Xaf);
        assert!(close(q.original_fee_percentage, 0.006));
        assert!(close(q.effective_fee_percentage, 0.006));
        assert!(!q.include_withdrawal_fee);
        assert_eq!(q.remaining_loyalty_points, None);
    }

    #[test]
    fn receive_side_inverts_send_side() {
        let q = TransferCalculator::with_static_tables()
            .quote(&fr_ga_card_airtel(65_200.0, AmountSide::Receive))
            .unwrap();
        assert_eq!(q.amount_received, 65_200.0);
        assert!((q.amount_sent - 100.0).abs() < 0.011);
        assert!((q.platform_fee - 0.60).abs() < 0.011);
    }

    #[test]
    fn rejects_bad_amounts() {
        let calc = TransferCalculator::with_static_tables();
        for amount in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                calc.quote(&fr_ga_card_airtel(amount, AmountSide::Send)),
                Err(PricingError::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn receive_only_rail_cannot_pay() {
        let req = QuoteRequest::send(
            100.0,
            corridor(Country::FR, Country::GA),
            RailPair {
                payment: Rail::VisaDirect,
                receiving: Rail::Cash,
            },
        );
        assert!(matches!(
            TransferCalculator::with_static_tables().quote(&req),
            Err(PricingError::RailNotAllowed { .. })
        ));
    }

    #[test]
    fn missing_fee_rule() {
        let req = QuoteRequest::send(
            100.0,
            corridor(Country::FR, Country::GA),
            rails(Rail::Card, Rail::MoovMoney),
        );
        let err = TransferCalculator::with_static_tables()
            .quote(&req)
            .unwrap_err();
        assert!(matches!(err, PricingError::FeeUnavailable { .. }));
        assert!(err.to_string().contains("FRANCE_TO_GABON"));
    }

    #[test]
    fn missing_rate() {
        let req = QuoteRequest::send(
            100.0,
            corridor(Country::US, Country::GA),
            rails(Rail::Ach, Rail::Cash),
        );
        assert!(matches!(
            TransferCalculator::with_static_tables().quote(&req),
            Err(PricingError::RateUnavailable {
                from: Currency::Usd,
                to: Currency::Xaf
            })
        ));
    }

    #[test]
    fn fee_of_one_hundred_percent_is_invalid() {
        let fr_ga = corridor(Country::FR, Country::GA);
        let tables = Arc::new(StaticTables::defaults().with_overrides(
            &[],
            &[FeeEntry {
                corridor: fr_ga,
                payment_method: Rail::Card,
                receiving_method: Rail::AirtelMoney,
                fee_percentage: 1.0,
            }],
        ));
        let calc = TransferCalculator::new(tables.clone(), tables);
        assert!(matches!(
            calc.quote(&fr_ga_card_airtel(100.0, AmountSide::Receive)),
            Err(PricingError::InvalidFeeConfiguration { .. })
        ));
    }

    #[test]
    fn percentage_promo_halves_fee() {
        let fr_ga = corridor(Country::FR, Country::GA);
        let calc = with_promos(vec![promo("HALF", fr_ga, DiscountType::Percentage, 50.0)]);
        let q = calc
            .quote(&fr_ga_card_airtel(100.0, AmountSide::Send).with_promo_code("half"))
            .unwrap();
        assert!(close(q.effective_fee_percentage, 0.003));
        assert!(close(q.platform_fee, 0.30));
        // 99.70 EUR at 655.96 is 65 399.21 XAF, rounded down to the 5 XAF step.
        assert_eq!(q.amount_received, 65_395.0);
        assert!(q.promo_code_id.is_some());
    }

    #[test]
    fn fixed_promo_on_receive_side_uses_send_principal() {
        let fr_ga = corridor(Country::FR, Country::GA);
        let calc = with_promos(vec![promo("MINUS30", fr_ga, DiscountType::Fixed, 0.30)]);
        let req = fr_ga_card_airtel(65_596.0, AmountSide::Receive).with_promo_code("MINUS30");
        let q = calc.quote(&req).unwrap();
        // 65 596 XAF is 100 EUR before fees; 0.30 EUR off is 0.3 % of it.
        assert!((q.effective_fee_percentage - 0.003).abs() < 1e-9);
    }

    #[test]
    fn promo_is_scoped_to_its_corridor() {
        let fr_ga = corridor(Country::FR, Country::GA);
        let calc = with_promos(vec![promo("FRGA", fr_ga, DiscountType::Percentage, 10.0)]);
        let req = QuoteRequest::send(
            10_000.0,
            corridor(Country::GA, Country::FR),
            rails(Rail::AirtelMoney, Rail::BankTransfer),
        )
        .with_promo_code("FRGA");
        assert!(matches!(
            calc.quote(&req),
            Err(PricingError::Promo(PromoError::WrongCorridor { .. }))
        ));
    }

    #[test]
    fn blank_promo_code_is_ignored() {
        let q = TransferCalculator::with_static_tables()
            .quote(&fr_ga_card_airtel(100.0, AmountSide::Send).with_promo_code("  "))
            .unwrap();
        assert_eq!(q.promo_code_id, None);
    }

    fn loyalty_calc(user: UserId, balance: u32) -> TransferCalculator {
        let ledger = InMemoryLoyaltyLedger::default();
        ledger.set_balance(user, balance);
        TransferCalculator::with_static_tables().with_loyalty_service(Arc::new(ledger))
    }

    #[test]
    fn loyalty_reduces_fee_out_of_gabon() {
        let user = UserId::new();
        let req = QuoteRequest::send(
            100_000.0,
            corridor(Country::GA, Country::FR),
            rails(Rail::AirtelMoney, Rail::BankTransfer),
        )
        .for_user(user)
        .with_loyalty_points(500);
        let q = loyalty_calc(user, 1_000).quote(&req).unwrap();
        // 8 000 XAF fee minus 500 points (5 EUR = 3 279.8 XAF).
        assert_eq!(q.platform_fee, 4_725.0);
        assert!(close(q.loyalty_discount, 3_279.8));
        assert_eq!(q.loyalty_points_used, 500);
        assert_eq!(q.remaining_loyalty_points, Some(500));
        assert!(close(q.amount_received, 145.21));
        assert_eq!(q.amount_sent, 100_000.0);
    }

    #[test]
    fn loyalty_ignored_into_gabon() {
        let user = UserId::new();
        let req = fr_ga_card_airtel(100.0, AmountSide::Send)
            .for_user(user)
            .with_loyalty_points(500);
        let q = loyalty_calc(user, 1_000).quote(&req).unwrap();
        assert_eq!(q.loyalty_points_used, 0);
        assert_eq!(q.remaining_loyalty_points, None);
        assert!(close(q.platform_fee, 0.60));
    }

    #[test]
    fn loyalty_can_absorb_the_whole_fee() {
        let user = UserId::new();
        let req = QuoteRequest::receive(
            10.0,
            corridor(Country::GA, Country::FR),
            rails(Rail::AirtelMoney, Rail::BankTransfer),
        )
        .for_user(user)
        .with_loyalty_points(500);
        let q = loyalty_calc(user, 1_000).quote(&req).unwrap();
        assert_eq!(q.platform_fee, 0.0);
        // 10 EUR / 0.001524 = 6 561.68 XAF, rounded up to 5.
        assert_eq!(q.amount_sent, 6_565.0);
        assert_eq!(q.amount_received, 10.0);
    }

    #[test]
    fn promo_rate_applies_before_loyalty_amount() {
        let user = UserId::new();
        let ga_fr = corridor(Country::GA, Country::FR);
        let pair = rails(Rail::AirtelMoney, Rail::BankTransfer);
        let ledger = InMemoryLoyaltyLedger::default();
        ledger.set_balance(user, 1_000);
        let calc = with_promos(vec![promo("HALF", ga_fr, DiscountType::Percentage, 50.0)])
            .with_loyalty_service(Arc::new(ledger));

        let sent = calc
            .quote(
                &QuoteRequest::send(100_000.0, ga_fr, pair)
                    .for_user(user)
                    .with_promo_code("HALF")
                    .with_loyalty_points(500),
            )
            .unwrap();
        // 8 % halved to 4 % is 4 000 XAF, minus 3 279.8 XAF of points.
        assert!(close(sent.effective_fee_percentage, 0.04));
        assert_eq!(sent.platform_fee, 725.0);
        assert!(close(sent.amount_received, 151.3));

        let back = calc
            .quote(
                &QuoteRequest::receive(sent.amount_received, ga_fr, pair)
                    .for_user(user)
                    .with_promo_code("HALF")
                    .with_loyalty_points(500),
            )
            .unwrap();
        assert_eq!(back.amount_sent, 100_000.0);
        assert_eq!(back.platform_fee, 725.0);
    }

    #[test]
    fn withdrawal_fee_on_send_side_reduces_receive() {
        let req = fr_ga_card_airtel(100.0, AmountSide::Send).with_withdrawal_fee(true);
        let q = TransferCalculator::with_static_tables().quote(&req).unwrap();
        assert!(q.include_withdrawal_fee);
        assert_eq!(q.withdrawal_fee, 1_955.0);
        assert_eq!(q.amount_received, 63_245.0);
        assert_eq!(q.amount_sent, 100.0);
        assert!(close(q.withdrawal_fee_in_sender_currency, 2.98));
        assert!(close(q.total_fees, 3.58));
        assert_eq!(q.withdrawal_fee_lines.len(), 1);
    }

    #[test]
    fn withdrawal_fee_on_receive_side_raises_send() {
        let req = fr_ga_card_airtel(65_200.0, AmountSide::Receive).with_withdrawal_fee(true);
        let q = TransferCalculator::with_static_tables().quote(&req).unwrap();
        assert_eq!(q.amount_received, 65_200.0);
        assert_eq!(q.withdrawal_fee, 1_955.0);
        assert!((q.amount_sent - 102.98).abs() < 0.011);
    }

    #[test]
    fn withdrawal_flag_ignored_for_cash_payout() {
        let req = QuoteRequest::send(
            100.0,
            corridor(Country::FR, Country::GA),
            rails(Rail::Card, Rail::Cash),
        )
        .with_withdrawal_fee(true);
        let q = TransferCalculator::with_static_tables().quote(&req).unwrap();
        assert!(!q.include_withdrawal_fee);
        assert_eq!(q.withdrawal_fee, 0.0);
        assert_eq!(q.amount_received, 65_200.0);
    }

    #[test]
    fn solve_send_amount_branches() {
        assert!(close(solve_send_amount(99.4, 1.0, 0.006, 0.0), 100.0));
        // Discount bigger than any fee: sender pays only the principal.
        assert!(close(solve_send_amount(50.0, 1.0, 0.01, 10.0), 50.0));
        // Zero fee with a discount never produces a negative fee.
        assert!(close(solve_send_amount(50.0, 1.0, 0.0, 1.0), 50.0));
    }

    #[test]
    fn quote_serializes_snake_case() {
        let q = TransferCalculator::with_static_tables()
            .quote(&fr_ga_card_airtel(100.0, AmountSide::Send))
            .unwrap();
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["corridor"], "FRANCE_TO_GABON");
        assert_eq!(json["payment_method"], "CARD");
        assert_eq!(json["sender_currency"], "EUR");
        assert_eq!(json["amount_received"], 65_200.0);
    }

    proptest! {
        /// Sending P then asking for the resulting receive amount recovers P.
        #[test]
        fn send_receive_roundtrip_eur(p in 1.0f64..10_000.0) {
            let calc = TransferCalculator::with_static_tables();
            let sent = calc.quote(&fr_ga_card_airtel(p, AmountSide::Send)).unwrap();
            let back = calc
                .quote(&fr_ga_card_airtel(sent.amount_received, AmountSide::Receive))
                .unwrap();
            prop_assert!((back.amount_sent - p).abs() <= 0.02, "{} vs {}", back.amount_sent, p);
        }

        /// Same round trip with XAF on the paying side.
        #[test]
        fn send_receive_roundtrip_xaf(p in 5_000.0f64..2_000_000.0) {
            let calc = TransferCalculator::with_static_tables();
            let c = corridor(Country::GA, Country::FR);
            let r = rails(Rail::AirtelMoney, Rail::BankTransfer);
            let sent = calc.quote(&QuoteRequest::send(p, c, r)).unwrap();
            let back = calc
                .quote(&QuoteRequest::receive(sent.amount_received, c, r))
                .unwrap();
            prop_assert!((back.amount_sent - sent.amount_sent).abs() <= 10.0);
        }

        /// XAF paid amounts are rounded up and received amounts rounded down
        /// to multiples of 5.
        #[test]
        fn xaf_amounts_are_multiples_of_five(p in 1.0f64..1_000_000.0) {
            let calc = TransferCalculator::with_static_tables();
            let out = calc
                .quote(&QuoteRequest::send(
                    p,
                    corridor(Country::GA, Country::SN),
                    rails(Rail::MoovMoney, Rail::Wave),
                ))
                .unwrap();
            prop_assert_eq!(out.amount_sent % 5.0, 0.0);
            prop_assert!(out.amount_sent >= p);
            prop_assert_eq!(out.platform_fee % 5.0, 0.0);

            let inbound = calc.quote(&fr_ga_card_airtel(p / 100.0, AmountSide::Send)).unwrap();
            prop_assert_eq!(inbound.amount_received % 5.0, 0.0);
            prop_assert!(inbound.amount_received <= (p / 100.0) * 0.994 * 655.96 + 1e-4);
        }

        /// No discount can push the effective fee below zero.
        #[test]
        fn effective_fee_never_negative(value in 0.01f64..100_000.0, p in 1.0f64..5_000.0) {
            let fr_ga = corridor(Country::FR, Country::GA);
            let calc = with_promos(vec![promo("BIG", fr_ga, DiscountType::Fixed, value)]);
            let q = calc
                .quote(&fr_ga_card_airtel(p, AmountSide::Send).with_promo_code("BIG"))
                .unwrap();
            prop_assert!(q.effective_fee_percentage >= 0.0);
            prop_assert!(q.platform_fee >= 0.0);
        }
    }
}
