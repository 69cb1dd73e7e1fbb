//! Share allocation.
//!
//! [`allocate`] turns a total, a [`SplitMethod`] and the raw participant
//! inputs into the final list of shares, or rejects the request with every
//! problem it found. It is a pure function: no I/O and no hidden state, so
//! the same input always yields the same shares.
//!
//! Amounts are apportioned with the largest remainder method: each share gets
//! the floor of its exact quota in minor units and the leftover minor units
//! go, one each, to the shares with the largest fractional remainder (ties
//! resolved by input order). The shares therefore always add up to the total
//! exactly. For an equal split every remainder is the same, so the first
//! participants in input order receive the extra cent.

use std::collections::HashSet;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, NON_FIELD_ERRORS, SplitMethod, ValidationErrors};

/// Fraction digits kept on allocated percentages.
pub const PERCENT_SCALE: u32 = 10;

/// Tolerance applied when checking that percentages add up to 100 (1e-6).
pub const PERCENT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

const TOTAL_FIELD: &str = "total_amount";
const SHARES_SCOPE: &str = "shares";

/// One participant as supplied by the caller, before allocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInput {
    pub participant_id: Uuid,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
}

impl ParticipantInput {
    /// A participant of an equal split.
    #[must_use]
    pub fn new(participant_id: Uuid) -> Self {
        Self {
            participant_id,
            amount: None,
            percentage: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn percentage(mut self, percentage: Decimal) -> Self {
        self.percentage = Some(percentage);
        self
    }
}

/// A participant's allocated portion of an expense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalizedShare {
    pub participant_id: Uuid,
    pub amount: Money,
    pub percentage: Decimal,
}

fn share_field(index: usize, field: &str) -> String {
    format!("{SHARES_SCOPE}[{index}].{field}")
}

fn amount_message(err: EngineError) -> String {
    match err {
        EngineError::InvalidAmount(msg) => msg,
        other => other.to_string(),
    }
}

/// Per-share values that survived validation, depending on the method.
enum Weights {
    Equal,
    Percentage(Vec<Decimal>),
    Exact(Vec<Money>),
}

fn validate(
    total_amount: Decimal,
    method: SplitMethod,
    participants: &[ParticipantInput],
) -> Result<(Money, Weights), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let total = match Money::try_from(total_amount) {
        Ok(total) if total.is_positive() => Some(total),
        Ok(_) => {
            errors.add(TOTAL_FIELD, "must be greater than zero");
            None
        }
        Err(err) => {
            errors.add(TOTAL_FIELD, amount_message(err));
            None
        }
    };

    if participants.is_empty() {
        errors.add(SHARES_SCOPE, "at least one participant is required");
    }

    let mut seen = HashSet::with_capacity(participants.len());
    let mut reported = HashSet::new();
    for input in participants {
        let id = input.participant_id;
        if !seen.insert(id) && reported.insert(id) {
            errors.add(
                SHARES_SCOPE,
                format!("participant {id} appears more than once"),
            );
        }
    }

    let mut percentages = Vec::with_capacity(participants.len());
    let mut amounts = Vec::with_capacity(participants.len());
    let mut values_ok = true;

    for (index, input) in participants.iter().enumerate() {
        let id = input.participant_id;
        match method {
            SplitMethod::Equal => {
                if input.amount.is_some() || input.percentage.is_some() {
                    errors.add(
                        format!("{SHARES_SCOPE}[{index}]"),
                        format!(
                            "for equal split only participant identity is required (participant {id})"
                        ),
                    );
                }
            }
            SplitMethod::Percentage => match input.percentage {
                None => {
                    values_ok = false;
                    errors.add(
                        share_field(index, "percentage"),
                        format!(
                            "This field is required for the percentage split method (participant {id})."
                        ),
                    );
                }
                Some(percentage) if percentage.is_sign_negative() || percentage > Decimal::ONE_HUNDRED => {
                    values_ok = false;
                    errors.add(
                        share_field(index, "percentage"),
                        format!("must be between 0 and 100 (participant {id})"),
                    );
                }
                Some(percentage) => percentages.push(percentage),
            },
            SplitMethod::Exact => match input.amount.map(Money::try_from) {
                None => {
                    values_ok = false;
                    errors.add(
                        share_field(index, "amount"),
                        format!(
                            "This field is required for the exact split method (participant {id})."
                        ),
                    );
                }
                Some(Err(err)) => {
                    values_ok = false;
                    errors.add(
                        share_field(index, "amount"),
                        format!("{} (participant {id})", amount_message(err)),
                    );
                }
                Some(Ok(amount)) if amount.is_negative() => {
                    values_ok = false;
                    errors.add(
                        share_field(index, "amount"),
                        format!("must not be negative (participant {id})"),
                    );
                }
                Some(Ok(amount)) => amounts.push(amount),
            },
        }
    }

    // Aggregate checks only make sense once every value is usable.
    if values_ok {
        match method {
            SplitMethod::Equal => {}
            SplitMethod::Percentage => {
                if !percentages.is_empty() {
                    let sum: Decimal = percentages.iter().sum();
                    if (sum - Decimal::ONE_HUNDRED).abs() > PERCENT_EPSILON {
                        errors.add(NON_FIELD_ERRORS, "Total percentage must equal 100%.");
                    }
                }
            }
            SplitMethod::Exact => {
                if let Some(total) = total
                    && !amounts.is_empty()
                {
                    match Money::checked_sum(amounts.iter().copied()) {
                        Some(sum) if sum == total => {}
                        Some(_) => errors.add(
                            NON_FIELD_ERRORS,
                            "Total exact amounts must equal the total expense amount.",
                        ),
                        None => errors.add(NON_FIELD_ERRORS, "amounts too large"),
                    }
                }
            }
        }
    }

    let Some(total) = total else {
        return Err(errors);
    };
    let weights = match method {
        SplitMethod::Equal => Weights::Equal,
        SplitMethod::Percentage => Weights::Percentage(percentages),
        SplitMethod::Exact => Weights::Exact(amounts),
    };
    errors.into_result((total, weights))
}

/// Splits `total` proportionally to `weights` with the largest remainder
/// method. Returns `None` on arithmetic overflow or if nothing carries weight.
fn apportion(total: Money, weights: &[Decimal]) -> Option<Vec<Money>> {
    let weight_sum: Decimal = weights.iter().sum();
    if weight_sum <= Decimal::ZERO {
        return None;
    }

    let total_minor = Decimal::from(total.minor());
    let mut floors = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (index, weight) in weights.iter().enumerate() {
        let quota = total_minor.checked_mul(*weight)?.checked_div(weight_sum)?;
        let floor = quota.floor();
        floors.push(floor.to_i64()?);
        remainders.push((quota - floor, index));
    }

    let assigned = floors
        .iter()
        .try_fold(0i64, |acc, minor| acc.checked_add(*minor))?;
    let leftover = usize::try_from(total.minor().checked_sub(assigned)?).ok()?;
    if leftover > weights.len() {
        return None;
    }

    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (_, index) in remainders.into_iter().take(leftover) {
        floors[index] += 1;
    }

    Some(floors.into_iter().map(Money::new).collect())
}

/// Allocates `total_amount` among `participants` following `method`.
///
/// On success the returned shares are in input order, their amounts add up to
/// the total exactly and their percentages add up to 100 within
/// [`PERCENT_EPSILON`]. On failure every problem found is reported at once.
pub fn allocate(
    total_amount: Decimal,
    method: SplitMethod,
    participants: &[ParticipantInput],
) -> Result<Vec<FinalizedShare>, ValidationErrors> {
    let (total, weights) = validate(total_amount, method, participants)?;

    let overflow = || {
        let mut errors = ValidationErrors::new();
        errors.add(TOTAL_FIELD, "amount too large to allocate");
        errors
    };

    let (amounts, percentages) = match weights {
        Weights::Equal => {
            let count = Decimal::from(participants.len());
            let percentage = (Decimal::ONE_HUNDRED / count).round_dp(PERCENT_SCALE);
            let amounts = apportion(total, &vec![Decimal::ONE; participants.len()])
                .ok_or_else(overflow)?;
            (amounts, vec![percentage; participants.len()])
        }
        Weights::Percentage(percentages) => {
            let amounts = apportion(total, &percentages).ok_or_else(overflow)?;
            let percentages = percentages
                .into_iter()
                .map(|p| p.round_dp(PERCENT_SCALE))
                .collect();
            (amounts, percentages)
        }
        Weights::Exact(amounts) => {
            let total_major = total.to_decimal();
            let percentages = amounts
                .iter()
                .map(|amount| {
                    amount
                        .to_decimal()
                        .checked_mul(Decimal::ONE_HUNDRED)
                        .and_then(|v| v.checked_div(total_major))
                        .map(|p| p.round_dp(PERCENT_SCALE))
                })
                .collect::<Option<Vec<_>>>()
                .ok_or_else(overflow)?;
            (amounts, percentages)
        }
    };

    Ok(participants
        .iter()
        .zip(amounts)
        .zip(percentages)
        .map(|((input, amount), percentage)| FinalizedShare {
            participant_id: input.participant_id,
            amount,
            percentage,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn ids(count: usize) -> Vec<Uuid> {
        (0..count).map(|_| Uuid::new_v4()).collect()
    }

    fn equal(ids: &[Uuid]) -> Vec<ParticipantInput> {
        ids.iter().map(|id| ParticipantInput::new(*id)).collect()
    }

    fn amounts(shares: &[FinalizedShare]) -> Vec<i64> {
        shares.iter().map(|s| s.amount.minor()).collect()
    }

    fn percent_sum(shares: &[FinalizedShare]) -> Decimal {
        shares.iter().map(|s| s.percentage).sum()
    }

    #[test]
    fn equal_split_divides_evenly() {
        let ids = ids(3);
        let shares = allocate(dec!(3000), SplitMethod::Equal, &equal(&ids)).unwrap();

        assert_eq!(amounts(&shares), vec![100_000, 100_000, 100_000]);
        assert_eq!(shares[0].amount.to_string(), "1000.00");
        assert_eq!(shares[0].percentage, dec!(33.3333333333));
        assert_eq!(
            shares.iter().map(|s| s.participant_id).collect::<Vec<_>>(),
            ids
        );
    }

    #[test]
    fn equal_split_gives_leftover_cents_to_first_participants() {
        let ids = ids(3);
        let shares = allocate(dec!(100), SplitMethod::Equal, &equal(&ids)).unwrap();
        assert_eq!(amounts(&shares), vec![3334, 3333, 3333]);

        let shares = allocate(dec!(0.05), SplitMethod::Equal, &equal(&ids)).unwrap();
        assert_eq!(amounts(&shares), vec![2, 2, 1]);
    }

    #[test]
    fn equal_split_never_drifts_from_total() {
        for count in 1..=9 {
            let ids = ids(count);
            for total in [dec!(0.01), dec!(1), dec!(10.01), dec!(99.99), dec!(1234.57)] {
                let shares = allocate(total, SplitMethod::Equal, &equal(&ids)).unwrap();
                let sum: Money = shares.iter().map(|s| s.amount).sum();
                assert_eq!(sum, Money::try_from(total).unwrap());

                let expected = Decimal::ONE_HUNDRED / Decimal::from(count);
                for share in &shares {
                    assert!((share.percentage - expected).abs() <= PERCENT_EPSILON);
                }
            }
        }
    }

    #[test]
    fn single_participant_takes_everything() {
        let id = Uuid::new_v4();

        let shares = allocate(dec!(42.42), SplitMethod::Equal, &[ParticipantInput::new(id)])
            .unwrap();
        assert_eq!(shares[0].amount, Money::new(4242));
        assert_eq!(shares[0].percentage, dec!(100));

        let shares = allocate(
            dec!(42.42),
            SplitMethod::Percentage,
            &[ParticipantInput::new(id).percentage(dec!(100))],
        )
        .unwrap();
        assert_eq!(shares[0].amount, Money::new(4242));

        let shares = allocate(
            dec!(42.42),
            SplitMethod::Exact,
            &[ParticipantInput::new(id).amount(dec!(42.42))],
        )
        .unwrap();
        assert_eq!(shares[0].percentage, dec!(100));
    }

    #[test]
    fn percentage_split() {
        let ids = ids(3);
        let inputs = vec![
            ParticipantInput::new(ids[0]).percentage(dec!(50)),
            ParticipantInput::new(ids[1]).percentage(dec!(25)),
            ParticipantInput::new(ids[2]).percentage(dec!(25)),
        ];
        let shares = allocate(dec!(4000), SplitMethod::Percentage, &inputs).unwrap();

        assert_eq!(amounts(&shares), vec![200_000, 100_000, 100_000]);
        assert_eq!(shares[1].percentage, dec!(25));
    }

    #[test]
    fn percentage_split_keeps_the_sum_when_rounding() {
        let ids = ids(3);
        let inputs = vec![
            ParticipantInput::new(ids[0]).percentage(dec!(33.33)),
            ParticipantInput::new(ids[1]).percentage(dec!(33.33)),
            ParticipantInput::new(ids[2]).percentage(dec!(33.34)),
        ];
        let shares = allocate(dec!(10), SplitMethod::Percentage, &inputs).unwrap();

        // quotas are 333.3, 333.3 and 333.4: the last one has the largest remainder
        assert_eq!(amounts(&shares), vec![333, 333, 334]);
        assert_eq!(percent_sum(&shares), dec!(100));
    }

    #[test]
    fn percentage_split_accepts_rounding_noise() {
        let ids = ids(3);
        let third = dec!(33.3333333);
        let inputs = vec![
            ParticipantInput::new(ids[0]).percentage(third),
            ParticipantInput::new(ids[1]).percentage(third),
            ParticipantInput::new(ids[2]).percentage(dec!(33.3333334)),
        ];
        let shares = allocate(dec!(300), SplitMethod::Percentage, &inputs).unwrap();
        assert_eq!(amounts(&shares), vec![10_000, 10_000, 10_000]);

        let inputs = vec![
            ParticipantInput::new(ids[0]).percentage(third),
            ParticipantInput::new(ids[1]).percentage(third),
            ParticipantInput::new(ids[2]).percentage(third),
        ];
        let shares = allocate(dec!(300), SplitMethod::Percentage, &inputs).unwrap();
        let sum: Money = shares.iter().map(|s| s.amount).sum();
        assert_eq!(sum, Money::new(30_000));
    }

    #[test]
    fn percentage_split_not_summing_to_100_is_one_aggregate_error() {
        let ids = ids(2);
        let inputs = vec![
            ParticipantInput::new(ids[0]).percentage(dec!(30)),
            ParticipantInput::new(ids[1]).percentage(dec!(30)),
        ];
        let errors = allocate(dec!(1000), SplitMethod::Percentage, &inputs).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(NON_FIELD_ERRORS),
            Some(&["Total percentage must equal 100%.".to_string()][..])
        );

        for last in [dec!(49), dec!(51)] {
            let ids = ids.clone();
            let inputs = vec![
                ParticipantInput::new(ids[0]).percentage(dec!(50)),
                ParticipantInput::new(ids[1]).percentage(last),
            ];
            let errors = allocate(dec!(1000), SplitMethod::Percentage, &inputs).unwrap_err();
            assert_eq!(errors.get(NON_FIELD_ERRORS).map(<[String]>::len), Some(1));
        }
    }

    #[test]
    fn percentage_split_requires_every_percentage() {
        let ids = ids(2);
        let inputs = vec![
            ParticipantInput::new(ids[0]).percentage(dec!(100)),
            ParticipantInput::new(ids[1]),
        ];
        let errors = allocate(dec!(10), SplitMethod::Percentage, &inputs).unwrap_err();

        let messages = errors.get("shares[1].percentage").unwrap();
        assert!(messages[0].contains(&ids[1].to_string()));
        assert!(!errors.contains_key(NON_FIELD_ERRORS));
    }

    #[test]
    fn percentage_out_of_range_is_rejected() {
        let ids = ids(2);
        let inputs = vec![
            ParticipantInput::new(ids[0]).percentage(dec!(150)),
            ParticipantInput::new(ids[1]).percentage(dec!(-50)),
        ];
        let errors = allocate(dec!(10), SplitMethod::Percentage, &inputs).unwrap_err();
        assert!(errors.contains_key("shares[0].percentage"));
        assert!(errors.contains_key("shares[1].percentage"));
    }

    #[test]
    fn exact_split() {
        let ids = ids(3);
        let inputs = vec![
            ParticipantInput::new(ids[0]).amount(dec!(1000)),
            ParticipantInput::new(ids[1]).amount(dec!(700)),
            ParticipantInput::new(ids[2]).amount(dec!(300)),
        ];
        let shares = allocate(dec!(2000), SplitMethod::Exact, &inputs).unwrap();

        assert_eq!(amounts(&shares), vec![100_000, 70_000, 30_000]);
        assert_eq!(
            shares.iter().map(|s| s.percentage).collect::<Vec<_>>(),
            vec![dec!(50), dec!(35), dec!(15)]
        );
        let sum: Money = shares.iter().map(|s| s.amount).sum();
        assert_eq!(sum, Money::new(200_000));
    }

    #[test]
    fn exact_split_percentages_sum_to_100() {
        let ids = ids(3);
        let inputs = vec![
            ParticipantInput::new(ids[0]).amount(dec!(3.33)),
            ParticipantInput::new(ids[1]).amount(dec!(3.33)),
            ParticipantInput::new(ids[2]).amount(dec!(3.34)),
        ];
        let shares = allocate(dec!(10), SplitMethod::Exact, &inputs).unwrap();
        assert!((percent_sum(&shares) - Decimal::ONE_HUNDRED).abs() <= PERCENT_EPSILON);
    }

    #[test]
    fn exact_split_mismatch_is_one_aggregate_error() {
        let ids = ids(2);
        let inputs = vec![
            ParticipantInput::new(ids[0]).amount(dec!(10)),
            ParticipantInput::new(ids[1]).amount(dec!(10)),
        ];
        let errors = allocate(dec!(25), SplitMethod::Exact, &inputs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(NON_FIELD_ERRORS),
            Some(&["Total exact amounts must equal the total expense amount.".to_string()][..])
        );
    }

    #[test]
    fn exact_split_reports_missing_and_malformed_amounts_together() {
        let ids = ids(3);
        let inputs = vec![
            ParticipantInput::new(ids[0]).percentage(dec!(50)),
            ParticipantInput::new(ids[1]).amount(dec!(1.234)),
            ParticipantInput::new(ids[2]).amount(dec!(-1)),
        ];
        let errors = allocate(dec!(10), SplitMethod::Exact, &inputs).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.contains_key("shares[0].amount"));
        assert!(errors.get("shares[1].amount").unwrap()[0].starts_with("too many decimals"));
        assert!(errors.contains_key("shares[2].amount"));
    }

    #[test]
    fn equal_split_rejects_amount_or_percentage() {
        let ids = ids(3);
        let inputs = vec![
            ParticipantInput::new(ids[0]),
            ParticipantInput::new(ids[1]).amount(dec!(5)),
            ParticipantInput::new(ids[2]).percentage(dec!(10)),
        ];
        let errors = allocate(dec!(15), SplitMethod::Equal, &inputs).unwrap_err();

        assert_eq!(errors.len(), 2);
        let messages = errors.get("shares[1]").unwrap();
        assert!(messages[0].starts_with("for equal split only participant identity is required"));
        assert!(messages[0].contains(&ids[1].to_string()));
        assert!(errors.contains_key("shares[2]"));
    }

    #[test]
    fn duplicate_participant_is_rejected() {
        let id = Uuid::new_v4();
        let inputs = vec![
            ParticipantInput::new(id),
            ParticipantInput::new(id),
            ParticipantInput::new(id),
        ];
        let errors = allocate(dec!(30), SplitMethod::Equal, &inputs).unwrap_err();
        assert_eq!(
            errors.get("shares"),
            Some(&[format!("participant {id} appears more than once")][..])
        );
    }

    #[test]
    fn structural_and_total_errors() {
        let errors = allocate(dec!(0), SplitMethod::Equal, &[]).unwrap_err();
        assert!(errors.contains_key("total_amount"));
        assert!(errors.contains_key("shares"));

        let errors = allocate(
            dec!(10.001),
            SplitMethod::Equal,
            &[ParticipantInput::new(Uuid::new_v4())],
        )
        .unwrap_err();
        assert_eq!(
            errors.get("total_amount"),
            Some(&["too many decimals".to_string()][..])
        );

        let errors = allocate(
            dec!(-5),
            SplitMethod::Equal,
            &[ParticipantInput::new(Uuid::new_v4())],
        )
        .unwrap_err();
        assert!(errors.contains_key("total_amount"));
    }

    #[test]
    fn huge_totals_fail_validation_instead_of_panicking() {
        let errors = allocate(
            Decimal::MAX,
            SplitMethod::Equal,
            &[ParticipantInput::new(Uuid::new_v4())],
        )
        .unwrap_err();
        assert!(errors.contains_key("total_amount"));

        let ids = ids(2);
        let inputs = vec![
            ParticipantInput::new(ids[0]).amount(dec!(90000000000000000)),
            ParticipantInput::new(ids[1]).amount(dec!(90000000000000000)),
        ];
        let errors = allocate(dec!(1), SplitMethod::Exact, &inputs).unwrap_err();
        assert!(errors.contains_key(NON_FIELD_ERRORS));
    }

    #[test]
    fn allocation_is_deterministic() {
        let ids = ids(4);
        let inputs = vec![
            ParticipantInput::new(ids[0]).percentage(dec!(12.5)),
            ParticipantInput::new(ids[1]).percentage(dec!(37.5)),
            ParticipantInput::new(ids[2]).percentage(dec!(10)),
            ParticipantInput::new(ids[3]).percentage(dec!(40)),
        ];
        let first = allocate(dec!(77.77), SplitMethod::Percentage, &inputs).unwrap();
        let second = allocate(dec!(77.77), SplitMethod::Percentage, &inputs).unwrap();
        assert_eq!(first, second);
    }
}
