//! Eligibility evaluator.
//!
//! Decides whether a membership owes a charge this period. Pure and
//! deterministic: a membership is eligible only when the member is Active,
//! the membership is Active, and auto-renewal is on. Everything else is a
//! skip with a named reason.

use std::fmt;

use gymbook_shared::{Member, MemberStatus, Membership, MembershipStatus};

/// Why a membership was not charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MemberNotActive,
    MembershipNotActive,
    AutoRenewalDisabled,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemberNotActive => "member-not-active",
            Self::MembershipNotActive => "membership-not-active",
            Self::AutoRenewalDisabled => "auto-renewal-disabled",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityVerdict {
    Eligible,
    Skipped(SkipReason),
}

impl EligibilityVerdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Judge one membership of one member.
pub fn evaluate(member: &Member, membership: &Membership) -> EligibilityVerdict {
    match member.status {
        MemberStatus::Inactive | MemberStatus::Suspended => {
            return EligibilityVerdict::Skipped(SkipReason::MemberNotActive);
        }
        MemberStatus::Active => {}
    }

    match membership.status {
        MembershipStatus::Paused | MembershipStatus::Cancelled => {
            return EligibilityVerdict::Skipped(SkipReason::MembershipNotActive);
        }
        MembershipStatus::Active => {}
    }

    if !membership.auto_renewal {
        return EligibilityVerdict::Skipped(SkipReason::AutoRenewalDisabled);
    }

    EligibilityVerdict::Eligible
}

/// The subset of memberships that owe a charge this period.
pub fn eligible_memberships<'a>(
    member: &Member,
    memberships: &'a [Membership],
) -> Vec<&'a Membership> {
    memberships
        .iter()
        .filter(|membership| evaluate(member, membership).is_eligible())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn member(status: MemberStatus) -> Member {
        Member {
            id: Uuid::new_v4(),
            gym_id: Uuid::new_v4(),
            name: "Ana".to_string(),
            status,
            total_debt_cents: 0,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn membership(status: MembershipStatus, auto_renewal: bool) -> Membership {
        Membership {
            id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            activity_id: Uuid::new_v4(),
            activity_name: "CrossFit".to_string(),
            price_snapshot_cents: 10_000,
            status,
            auto_renewal,
            start_date: date!(2026 - 01 - 01),
            end_date: None,
        }
    }

    #[test]
    fn full_decision_table() {
        let member_states = [
            MemberStatus::Active,
            MemberStatus::Inactive,
            MemberStatus::Suspended,
        ];
        let membership_states = [
            MembershipStatus::Active,
            MembershipStatus::Paused,
            MembershipStatus::Cancelled,
        ];

        for member_status in member_states {
            for membership_status in membership_states {
                for auto_renewal in [true, false] {
                    let verdict = evaluate(
                        &member(member_status),
                        &membership(membership_status, auto_renewal),
                    );
                    let expected = member_status == MemberStatus::Active
                        && membership_status == MembershipStatus::Active
                        && auto_renewal;
                    assert_eq!(
                        verdict.is_eligible(),
                        expected,
                        "member={member_status:?} membership={membership_status:?} auto_renewal={auto_renewal}"
                    );
                }
            }
        }
    }

    #[test]
    fn skip_reasons_are_specific() {
        assert_eq!(
            evaluate(
                &member(MemberStatus::Suspended),
                &membership(MembershipStatus::Active, true)
            ),
            EligibilityVerdict::Skipped(SkipReason::MemberNotActive)
        );
        assert_eq!(
            evaluate(
                &member(MemberStatus::Active),
                &membership(MembershipStatus::Paused, true)
            ),
            EligibilityVerdict::Skipped(SkipReason::MembershipNotActive)
        );
        assert_eq!(
            evaluate(
                &member(MemberStatus::Active),
                &membership(MembershipStatus::Active, false)
            ),
            EligibilityVerdict::Skipped(SkipReason::AutoRenewalDisabled)
        );
    }

    #[test]
    fn member_status_outranks_membership_detail() {
        // A suspended member with a paused membership reports the member
        // problem first.
        assert_eq!(
            evaluate(
                &member(MemberStatus::Suspended),
                &membership(MembershipStatus::Paused, false)
            ),
            EligibilityVerdict::Skipped(SkipReason::MemberNotActive)
        );
    }

    #[test]
    fn filters_to_eligible_subset() {
        let owner = member(MemberStatus::Active);
        let memberships = vec![
            membership(MembershipStatus::Active, true),
            membership(MembershipStatus::Active, false),
            membership(MembershipStatus::Paused, true),
            membership(MembershipStatus::Active, true),
        ];

        let eligible = eligible_memberships(&owner, &memberships);
        assert_eq!(eligible.len(), 2);
        assert!(eligible
            .iter()
            .all(|m| m.status == MembershipStatus::Active && m.auto_renewal));
    }
}
