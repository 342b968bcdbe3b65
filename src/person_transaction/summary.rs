//! Netting of transfers between pairs of people.
//!
//! Transfers are grouped by direction and currency, each group is merged with
//! its mirror (the same two people in the opposite direction), and one net
//! figure is produced per pair of people and currency. Pairs that net to zero
//! are left out.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    money::{checked_difference, checked_sum},
    person_transaction::TransferStatus,
    user::UserId,
};

/// A single directional, currency-tagged movement of money between two people.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    /// The person paying.
    pub source_id: UserId,
    /// The person being paid.
    pub destination_id: UserId,
    /// The currency code as stored. Not validated, an empty code forms its own group.
    pub currency: String,
    /// The amount paid from `source_id` to `destination_id`.
    pub amount: Decimal,
    /// Why the money was paid.
    pub purpose: String,
    /// When the transfer is or was due.
    pub schedule_date: Date,
    /// Whether the money has changed hands.
    pub status: TransferStatus,
}

/// One transfer inside a [NetSummary].
///
/// `amount` is signed relative to the direction of the summary: transfers in
/// the opposite direction appear negated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferDetail {
    /// Why the money was paid.
    pub purpose: String,
    /// The signed amount.
    pub amount: Decimal,
    /// When the transfer is or was due.
    pub schedule_date: Date,
    /// Whether the money has changed hands.
    pub status: TransferStatus,
}

impl From<&Transfer> for TransferDetail {
    fn from(transfer: &Transfer) -> Self {
        Self {
            purpose: transfer.purpose.clone(),
            amount: transfer.amount,
            schedule_date: transfer.schedule_date,
            status: transfer.status,
        }
    }
}

impl TransferDetail {
    fn negated(&self) -> Self {
        Self {
            amount: -self.amount,
            ..self.clone()
        }
    }
}

/// The exact direction and currency of a group of transfers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DirectedKey {
    source_id: UserId,
    destination_id: UserId,
    currency: String,
}

impl DirectedKey {
    fn reversed(&self) -> Self {
        Self {
            source_id: self.destination_id,
            destination_id: self.source_id,
            currency: self.currency.clone(),
        }
    }

    fn pair_key(&self) -> PairKey {
        PairKey {
            low_id: self.source_id.min(self.destination_id),
            high_id: self.source_id.max(self.destination_id),
            currency: self.currency.clone(),
        }
    }
}

/// The unordered pair of people and currency that a group and its mirror share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairKey {
    low_id: UserId,
    high_id: UserId,
    currency: String,
}

/// The transfers in one exact direction and currency.
#[derive(Debug, Clone, PartialEq)]
struct TransferGroup {
    key: DirectedKey,
    total: Decimal,
    details: Vec<TransferDetail>,
}

/// The net amount owed between two people in one currency.
///
/// `net_amount` is always positive: `source_id` is the person who paid more.
#[derive(Debug, Clone, PartialEq)]
pub struct NetSummary {
    /// The person who paid more overall.
    pub source_id: UserId,
    /// The person who received more overall.
    pub destination_id: UserId,
    /// The currency of the amounts.
    pub currency: String,
    /// The total paid by `source_id` less the total paid back by `destination_id`.
    pub net_amount: Decimal,
    /// The transfers in both directions, forward leg first.
    pub details: Vec<TransferDetail>,
}

/// A [NetSummary] labelled with the short names of both people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetSummaryView {
    /// The person who paid more overall.
    pub source_id: UserId,
    /// The person who received more overall.
    pub destination_id: UserId,
    /// The currency of the amounts.
    pub currency: String,
    /// The net amount paid from source to destination.
    pub net_amount: Decimal,
    /// The transfers in both directions.
    pub details: Vec<TransferDetail>,
    /// The short name of the source, or its ID if it has none.
    pub source_short_name: String,
    /// The short name of the destination, or its ID if it has none.
    pub destination_short_name: String,
}

/// Net the transfers between each pair of people per currency.
///
/// Summaries are returned in the order each pair first appears in `transfers`,
/// and pairs whose transfers cancel out are omitted.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a total or net amount does not fit in a [Decimal].
pub fn summarize(transfers: &[Transfer]) -> Result<Vec<NetSummary>, Error> {
    merge_mirrors(&group_transfers(transfers)?)
}

/// Group `transfers` by exact direction and currency, in order of first appearance.
fn group_transfers(transfers: &[Transfer]) -> Result<Vec<TransferGroup>, Error> {
    let mut positions: HashMap<DirectedKey, usize> = HashMap::new();
    let mut groups: Vec<TransferGroup> = Vec::new();

    for transfer in transfers {
        let key = DirectedKey {
            source_id: transfer.source_id,
            destination_id: transfer.destination_id,
            currency: transfer.currency.clone(),
        };

        let position = *positions.entry(key.clone()).or_insert_with(|| {
            groups.push(TransferGroup {
                key,
                total: Decimal::ZERO,
                details: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[position];
        group.total = checked_sum("total", group.total, transfer.amount)?;
        group.details.push(TransferDetail::from(transfer));
    }

    Ok(groups)
}

/// Merge each group with its mirror, emitting one summary per pair and currency.
fn merge_mirrors(groups: &[TransferGroup]) -> Result<Vec<NetSummary>, Error> {
    let by_key: HashMap<&DirectedKey, &TransferGroup> =
        groups.iter().map(|group| (&group.key, group)).collect();

    let (_, summaries) = groups.iter().try_fold(
        (HashSet::new(), Vec::new()),
        |(mut visited, mut summaries): (HashSet<PairKey>, Vec<NetSummary>), forward| {
            if visited.insert(forward.key.pair_key()) {
                let reverse_key = forward.key.reversed();
                let reverse = (reverse_key != forward.key)
                    .then(|| by_key.get(&reverse_key).copied())
                    .flatten();

                summaries.extend(net_pair(forward, reverse)?);
            }

            Ok::<_, Error>((visited, summaries))
        },
    )?;

    Ok(summaries)
}

/// Net a group against its mirror, oriented so the net amount is positive.
fn net_pair(
    forward: &TransferGroup,
    reverse: Option<&TransferGroup>,
) -> Result<Option<NetSummary>, Error> {
    let reverse_total = reverse.map_or(Decimal::ZERO, |group| group.total);
    let net_amount = checked_difference("net_amount", forward.total, reverse_total)?;

    if net_amount.is_zero() {
        return Ok(None);
    }

    let details: Vec<TransferDetail> = forward
        .details
        .iter()
        .cloned()
        .chain(
            reverse
                .into_iter()
                .flat_map(|group| group.details.iter().map(TransferDetail::negated)),
        )
        .collect();

    let summary = if net_amount.is_sign_positive() {
        NetSummary {
            source_id: forward.key.source_id,
            destination_id: forward.key.destination_id,
            currency: forward.key.currency.clone(),
            net_amount,
            details,
        }
    } else {
        NetSummary {
            source_id: forward.key.destination_id,
            destination_id: forward.key.source_id,
            currency: forward.key.currency.clone(),
            net_amount: -net_amount,
            details: details.iter().map(TransferDetail::negated).collect(),
        }
    };

    Ok(Some(summary))
}

/// Look up the short name for `id`, falling back to the ID itself.
pub fn short_name_or_id(short_names: &HashMap<UserId, String>, id: UserId) -> String {
    short_names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| id.to_string())
}

impl NetSummary {
    /// Label the summary with short names from `short_names`.
    pub fn with_short_names(self, short_names: &HashMap<UserId, String>) -> NetSummaryView {
        NetSummaryView {
            source_short_name: short_name_or_id(short_names, self.source_id),
            destination_short_name: short_name_or_id(short_names, self.destination_id),
            source_id: self.source_id,
            destination_id: self.destination_id,
            currency: self.currency,
            net_amount: self.net_amount,
            details: self.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{Error, person_transaction::TransferStatus, user::UserId};

    use super::{Transfer, group_transfers, short_name_or_id, summarize};

    const A: UserId = 1;
    const B: UserId = 2;
    const C: UserId = 3;

    fn transfer(source_id: UserId, destination_id: UserId, amount: Decimal) -> Transfer {
        transfer_in(source_id, destination_id, amount, "USD")
    }

    fn transfer_in(
        source_id: UserId,
        destination_id: UserId,
        amount: Decimal,
        currency: &str,
    ) -> Transfer {
        Transfer {
            source_id,
            destination_id,
            currency: currency.to_owned(),
            amount,
            purpose: format!("{source_id} pays {destination_id}"),
            schedule_date: date!(2025 - 01 - 01),
            status: TransferStatus::Completed,
        }
    }

    fn detail_amounts(summary: &super::NetSummary) -> Vec<Decimal> {
        summary.details.iter().map(|detail| detail.amount).collect()
    }

    #[test]
    fn forward_only_nets_to_forward_sum() {
        let summaries = summarize(&[transfer(A, B, dec!(50))]).unwrap();

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!((summary.source_id, summary.destination_id), (A, B));
        assert_eq!(summary.net_amount, dec!(50));
        assert_eq!(detail_amounts(summary), [dec!(50)]);
    }

    #[test]
    fn forward_only_sums_every_transfer_in_that_direction() {
        let summaries = summarize(&[
            transfer(A, B, dec!(10.10)),
            transfer(A, B, dec!(20.20)),
            transfer(A, B, dec!(0.01)),
        ])
        .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].net_amount, dec!(30.31));
        assert_eq!(summaries[0].details.len(), 3);
    }

    #[test]
    fn mirror_is_netted_and_negated() {
        let summaries =
            summarize(&[transfer(A, B, dec!(100)), transfer(B, A, dec!(40))]).unwrap();

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!((summary.source_id, summary.destination_id), (A, B));
        assert_eq!(summary.currency, "USD");
        assert_eq!(summary.net_amount, dec!(60));
        assert_eq!(detail_amounts(summary), [dec!(100), dec!(-40)]);
        assert_eq!(summary.details[1].purpose, "2 pays 1");
    }

    #[test]
    fn direction_does_not_depend_on_input_order() {
        let summaries =
            summarize(&[transfer(B, A, dec!(40)), transfer(A, B, dec!(100))]).unwrap();

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!((summary.source_id, summary.destination_id), (A, B));
        assert_eq!(summary.net_amount, dec!(60));
        assert_eq!(detail_amounts(summary), [dec!(-40), dec!(100)]);
    }

    #[test]
    fn zero_net_pairs_are_omitted() {
        let summaries =
            summarize(&[transfer(A, B, dec!(30)), transfer(B, A, dec!(30))]).unwrap();

        assert!(summaries.is_empty(), "got {summaries:?}");
    }

    #[test]
    fn pairs_are_emitted_at_most_once() {
        let summaries = summarize(&[
            transfer(A, B, dec!(5)),
            transfer(B, A, dec!(1)),
            transfer(A, B, dec!(5)),
            transfer(B, A, dec!(1)),
        ])
        .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].net_amount, dec!(8));
        assert_eq!(summaries[0].details.len(), 4);
    }

    #[test]
    fn currencies_are_netted_separately() {
        let summaries = summarize(&[
            transfer_in(A, B, dec!(100), "USD"),
            transfer_in(B, A, dec!(100), "INR"),
        ])
        .unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(
            (summaries[0].source_id, summaries[0].currency.as_str()),
            (A, "USD")
        );
        assert_eq!(
            (summaries[1].source_id, summaries[1].currency.as_str()),
            (B, "INR")
        );
    }

    #[test]
    fn empty_currency_forms_its_own_group() {
        let summaries = summarize(&[
            transfer_in(A, B, dec!(3), ""),
            transfer_in(A, B, dec!(4), "USD"),
        ])
        .unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].currency, "");
        assert_eq!(summaries[0].net_amount, dec!(3));
    }

    #[test]
    fn summaries_follow_first_appearance_of_each_pair() {
        let summaries = summarize(&[
            transfer(C, A, dec!(1)),
            transfer(A, B, dec!(2)),
            transfer(B, C, dec!(3)),
            transfer(A, C, dec!(4)),
        ])
        .unwrap();

        let pairs: Vec<_> = summaries
            .iter()
            .map(|summary| (summary.source_id, summary.destination_id, summary.net_amount))
            .collect();
        assert_eq!(
            pairs,
            [(A, C, dec!(3)), (A, B, dec!(2)), (B, C, dec!(3))]
        );
    }

    #[test]
    fn self_transfers_are_not_their_own_mirror() {
        let summaries = summarize(&[transfer(A, A, dec!(9))]).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].net_amount, dec!(9));
    }

    #[test]
    fn total_that_does_not_fit_is_an_error() {
        let result = summarize(&[
            transfer(A, B, Decimal::MAX),
            transfer(A, B, Decimal::MAX),
        ]);

        assert_eq!(result, Err(Error::AmountOverflow("total")));
    }

    #[test]
    fn net_that_does_not_fit_is_an_error() {
        let result = summarize(&[
            transfer(A, B, Decimal::MAX),
            transfer(B, A, Decimal::MIN),
        ]);

        assert_eq!(result, Err(Error::AmountOverflow("net_amount")));
    }

    #[test]
    fn largest_amounts_net_to_zero_without_overflow() {
        let summaries = summarize(&[
            transfer(A, B, Decimal::MAX),
            transfer(B, A, Decimal::MAX),
        ])
        .unwrap();

        assert!(summaries.is_empty());
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(summarize(&[]).unwrap().is_empty());
    }

    #[test]
    fn grouping_is_directional() {
        let groups = group_transfers(&[
            transfer(A, B, dec!(1)),
            transfer(B, A, dec!(2)),
            transfer(A, B, dec!(3)),
        ])
        .unwrap();

        let totals: Vec<_> = groups.iter().map(|group| group.total).collect();
        assert_eq!(totals, [dec!(4), dec!(2)]);
    }

    #[test]
    fn short_name_falls_back_to_id() {
        let short_names = HashMap::from([(A, "Mom".to_owned())]);

        assert_eq!(short_name_or_id(&short_names, A), "Mom");
        assert_eq!(short_name_or_id(&short_names, 42), "42");
    }

    #[test]
    fn with_short_names_labels_both_parties() {
        let short_names = HashMap::from([(A, "Mom".to_owned())]);
        let summary = summarize(&[transfer(A, B, dec!(1))]).unwrap().remove(0);

        let view = summary.with_short_names(&short_names);

        assert_eq!(view.source_short_name, "Mom");
        assert_eq!(view.destination_short_name, "2");
        assert_eq!(view.net_amount, dec!(1));
    }
}
