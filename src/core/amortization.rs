use crate::core::loan::{InvalidInputError, LoanParameters, RentalProfile, RepaymentFrequency};
use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;

/// Rental cash flow for a single repayment period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RentalCashFlow {
    pub rent_income: Decimal,
    pub agent_fee: Decimal,
    pub other_costs: Decimal,
    pub net_cash_flow: Decimal,
}

/// One repayment period of the schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub period_index: u32,
    pub date: NaiveDate,
    pub payment: Decimal,
    pub interest_paid: Decimal,
    pub principal_paid: Decimal,
    pub remaining_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rental: Option<RentalCashFlow>,
}

impl ScheduleEntry {
    pub fn net_cash_flow(&self) -> Option<Decimal> {
        self.rental.as_ref().map(|r| r.net_cash_flow)
    }
}

/// First period at which the property pays for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GearingPoint {
    pub period_index: u32,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub frequency: RepaymentFrequency,
    pub periodic_rate: Decimal,
    pub fixed_payment: Decimal,
    pub entries: Vec<ScheduleEntry>,
    pub total_interest_paid: Decimal,
    pub total_principal_paid: Decimal,
    pub positive_gearing: Option<GearingPoint>,
}

impl Schedule {
    pub fn has_rental(&self) -> bool {
        self.entries.iter().any(|e| e.rental.is_some())
    }

    pub fn total_payments(&self) -> Decimal {
        self.entries.iter().map(|e| e.payment).sum()
    }

    pub fn total_net_cash_flow(&self) -> Option<Decimal> {
        if !self.has_rental() {
            return None;
        }
        Some(self.entries.iter().filter_map(|e| e.net_cash_flow()).sum())
    }

    pub fn final_balance(&self) -> Decimal {
        self.entries
            .last()
            .map_or(Decimal::ZERO, |e| e.remaining_balance)
    }

    pub fn is_paid_off(&self) -> bool {
        self.final_balance().is_zero()
    }
}

/// Level repayment that amortizes `principal` over `total_periods`.
///
/// Zero rate falls back to straight-line repayment.
pub fn compute_fixed_periodic_payment(
    principal: Decimal,
    periodic_rate: Decimal,
    total_periods: u32,
) -> Result<Decimal, InvalidInputError> {
    if principal < Decimal::ZERO {
        return Err(InvalidInputError::NegativePrincipal(principal));
    }
    if periodic_rate < Decimal::ZERO {
        return Err(InvalidInputError::NegativeInterestRate(periodic_rate));
    }
    if total_periods < 1 {
        return Err(InvalidInputError::ZeroTerm);
    }

    let periods = Decimal::from(total_periods);
    if periodic_rate.is_zero() {
        return Ok(principal / periods);
    }

    let overflow = || InvalidInputError::CompoundOverflow {
        periodic_rate,
        total_periods,
    };
    let factor = Decimal::ONE
        .checked_add(periodic_rate)
        .and_then(|base| base.checked_powu(u64::from(total_periods)))
        .ok_or_else(overflow)?;
    let denominator = factor - Decimal::ONE;
    // rate too small to register at 28 digits of precision
    if denominator.is_zero() {
        return Ok(principal / periods);
    }
    principal
        .checked_mul(periodic_rate)
        .and_then(|n| n.checked_mul(factor))
        .and_then(|n| n.checked_div(denominator))
        .ok_or_else(overflow)
}

/// Generate the repayment schedule, with rental cash flow when a profile is given
pub fn generate_schedule(
    loan: &LoanParameters,
    rental: Option<&RentalProfile>,
) -> Result<Schedule, InvalidInputError> {
    loan.validate()?;
    if let Some(rental) = rental {
        rental.validate(loan.start_date)?;
    }

    let periodic_rate = loan.periodic_rate();
    let fixed_payment =
        compute_fixed_periodic_payment(loan.principal, periodic_rate, loan.total_periods())?;
    log::debug!(
        "Fixed {} payment {} at periodic rate {} over {} periods",
        loan.frequency,
        fixed_payment,
        periodic_rate,
        loan.total_periods()
    );

    let step = Duration::days(loan.frequency.period_days());
    let scheduled = fixed_payment
        .checked_add(loan.extra_repayment_per_period)
        .ok_or(InvalidInputError::AmountOverflow("scheduled payment"))?;
    let deductions = rental
        .map(|profile| -> Result<_, InvalidInputError> {
            Ok((profile.agent_fee()?, profile.other_costs()?))
        })
        .transpose()?;

    let mut entries = Vec::new();
    let mut balance = loan.principal;
    let mut date = loan.start_date;
    let mut total_interest_paid = Decimal::ZERO;
    let mut total_principal_paid = Decimal::ZERO;

    for period_index in 1..=loan.schedule_length_periods {
        let interest_paid = balance
            .checked_mul(periodic_rate)
            .ok_or(InvalidInputError::AmountOverflow("interest"))?;
        // the last period only pays what is owed, and the final nominal period
        // settles any rounding residue left by the fixed payment
        let principal_paid = if period_index >= loan.total_periods() {
            balance
        } else {
            (scheduled - interest_paid).min(balance)
        };
        let payment = interest_paid
            .checked_add(principal_paid)
            .ok_or(InvalidInputError::AmountOverflow("payment"))?;
        balance = (balance - principal_paid).max(Decimal::ZERO);

        total_interest_paid = total_interest_paid
            .checked_add(interest_paid)
            .ok_or(InvalidInputError::AmountOverflow("total interest"))?;
        total_principal_paid += principal_paid;

        let rental = match (rental, deductions) {
            (Some(profile), Some((agent_fee, other_costs))) => {
                let rent_income = profile.rent_on(date);
                let net_cash_flow = rent_income
                    .checked_sub(payment)
                    .and_then(|net| net.checked_sub(agent_fee))
                    .and_then(|net| net.checked_sub(other_costs))
                    .ok_or(InvalidInputError::AmountOverflow("net cash flow"))?;
                Some(RentalCashFlow {
                    rent_income,
                    agent_fee,
                    other_costs,
                    net_cash_flow,
                })
            }
            _ => None,
        };

        entries.push(ScheduleEntry {
            period_index,
            date,
            payment,
            interest_paid,
            principal_paid,
            remaining_balance: balance,
            rental,
        });
        date += step;

        if balance.is_zero() {
            log::debug!("Loan paid off at period {}", period_index);
            break;
        }
    }

    let positive_gearing = find_positive_gearing_point(&entries);
    Ok(Schedule {
        frequency: loan.frequency,
        periodic_rate,
        fixed_payment,
        entries,
        total_interest_paid,
        total_principal_paid,
        positive_gearing,
    })
}

/// First period whose net cash flow is non-negative, if any
pub fn find_positive_gearing_point(entries: &[ScheduleEntry]) -> Option<GearingPoint> {
    entries
        .iter()
        .find(|e| e.net_cash_flow().is_some_and(|net| net >= Decimal::ZERO))
        .map(|e| GearingPoint {
            period_index: e.period_index,
            date: e.date,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loan::PeriodicCost;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn loan(
        principal: Decimal,
        rate: Decimal,
        term_years: u32,
        frequency: RepaymentFrequency,
        periods: u32,
    ) -> LoanParameters {
        LoanParameters {
            principal,
            annual_interest_rate_percent: rate,
            term_years,
            frequency,
            extra_repayment_per_period: Decimal::ZERO,
            schedule_length_periods: periods,
            start_date: date("2024-01-01"),
        }
    }

    fn rental(rent: Decimal, starts: &str, fee: Decimal, costs: &[Decimal]) -> RentalProfile {
        RentalProfile {
            periodic_rent: rent,
            rent_start_date: date(starts),
            agent_fee_percent: fee,
            other_periodic_costs: costs
                .iter()
                .enumerate()
                .map(|(i, amount)| PeriodicCost::new(format!("cost {}", i), *amount))
                .collect(),
        }
    }

    #[test]
    fn annuity_payment_weekly_thirty_years() {
        let rate = dec!(0.06) / dec!(52);
        let payment = compute_fixed_periodic_payment(dec!(300000), rate, 1560).unwrap();

        let factor = (Decimal::ONE + rate).powu(1560);
        let expected = dec!(300000) * rate * factor / (factor - Decimal::ONE);
        assert_eq!(payment, expected);
        assert!((payment - dec!(414.79)).abs() < dec!(0.005), "{}", payment);
    }

    #[test]
    fn annuity_payment_monthly() {
        let payment = compute_fixed_periodic_payment(dec!(200000), dec!(0.005), 360).unwrap();
        assert_eq!(payment.round_dp(2), dec!(1199.10));
    }

    #[test]
    fn zero_rate_is_straight_line() {
        let payment = compute_fixed_periodic_payment(dec!(1000), Decimal::ZERO, 10).unwrap();
        assert_eq!(payment, dec!(100));
    }

    #[test]
    fn payment_input_errors() {
        assert_eq!(
            compute_fixed_periodic_payment(dec!(-1), dec!(0.01), 10),
            Err(InvalidInputError::NegativePrincipal(dec!(-1)))
        );
        assert_eq!(
            compute_fixed_periodic_payment(dec!(1000), dec!(-0.01), 10),
            Err(InvalidInputError::NegativeInterestRate(dec!(-0.01)))
        );
        assert_eq!(
            compute_fixed_periodic_payment(dec!(1000), dec!(0.01), 0),
            Err(InvalidInputError::ZeroTerm)
        );
    }

    #[test]
    fn compound_overflow_reported() {
        assert!(matches!(
            compute_fixed_periodic_payment(dec!(1000), dec!(10), 1000),
            Err(InvalidInputError::CompoundOverflow { .. })
        ));
    }

    #[test]
    fn zero_rate_schedule_pays_off_exactly() {
        let loan = loan(dec!(1200), Decimal::ZERO, 1, RepaymentFrequency::Monthly, 12);
        let schedule = generate_schedule(&loan, None).unwrap();

        assert_eq!(schedule.fixed_payment, dec!(100));
        assert_eq!(schedule.entries.len(), 12);
        assert!(schedule.entries.iter().all(|e| e.payment == dec!(100)));
        assert!(schedule.entries.iter().all(|e| e.interest_paid.is_zero()));
        assert_eq!(schedule.final_balance(), Decimal::ZERO);
        assert!(schedule.is_paid_off());
        assert_eq!(schedule.total_principal_paid, dec!(1200));
    }

    #[test]
    fn ten_period_zero_rate_loan() {
        let payment = compute_fixed_periodic_payment(dec!(1000), Decimal::ZERO, 10).unwrap();
        assert_eq!(payment, dec!(100));

        // extra repayment brings the 52 week term down to 10 periods
        let mut loan = loan(dec!(1000), Decimal::ZERO, 1, RepaymentFrequency::Weekly, 52);
        loan.extra_repayment_per_period = dec!(100) - dec!(1000) / dec!(52);
        let schedule = generate_schedule(&loan, None).unwrap();

        assert_eq!(schedule.entries.len(), 10);
        assert_eq!(schedule.entries[9].remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn dates_step_by_frequency() {
        for (frequency, days) in [
            (RepaymentFrequency::Weekly, 7),
            (RepaymentFrequency::Fortnightly, 14),
            (RepaymentFrequency::Monthly, 30),
        ] {
            let loan = loan(dec!(100000), dec!(5), 25, frequency, 3);
            let schedule = generate_schedule(&loan, None).unwrap();
            let dates: Vec<_> = schedule.entries.iter().map(|e| e.date).collect();
            assert_eq!(
                dates,
                vec![
                    date("2024-01-01"),
                    date("2024-01-01") + Duration::days(days),
                    date("2024-01-01") + Duration::days(days * 2),
                ]
            );
        }
    }

    #[test]
    fn schedule_invariants_hold() {
        let mut loan = loan(dec!(300000), dec!(6), 30, RepaymentFrequency::Weekly, 1560);
        loan.extra_repayment_per_period = dec!(150);
        let schedule = generate_schedule(&loan, None).unwrap();

        assert!(schedule.entries.len() < 1560);
        assert!(schedule.is_paid_off());

        let mut previous = loan.principal;
        for entry in &schedule.entries {
            assert_eq!(entry.interest_paid + entry.principal_paid, entry.payment);
            assert!(entry.remaining_balance <= previous);
            assert!(entry.remaining_balance >= Decimal::ZERO);
            previous = entry.remaining_balance;
        }

        let interest: Decimal = schedule.entries.iter().map(|e| e.interest_paid).sum();
        let principal: Decimal = schedule.entries.iter().map(|e| e.principal_paid).sum();
        assert_eq!(interest, schedule.total_interest_paid);
        assert_eq!(principal, schedule.total_principal_paid);
        assert!((principal - loan.principal).abs() < dec!(0.000001));
    }

    #[test]
    fn full_term_pays_off_exactly() {
        for (principal, rate, years, frequency) in [
            (dec!(300000), dec!(6), 30, RepaymentFrequency::Weekly),
            (dec!(450000), dec!(6.2), 30, RepaymentFrequency::Fortnightly),
            (dec!(200000), dec!(5), 30, RepaymentFrequency::Monthly),
            (dec!(1000), Decimal::ZERO, 3, RepaymentFrequency::Weekly),
            (dec!(333333.33), dec!(7.15), 25, RepaymentFrequency::Monthly),
        ] {
            let periods = years * frequency.payments_per_year();
            let loan = loan(principal, rate, years, frequency, periods);
            let schedule = generate_schedule(&loan, None).unwrap();

            assert_eq!(schedule.entries.len() as u32, periods, "{} {}", principal, frequency);
            assert_eq!(schedule.final_balance(), Decimal::ZERO, "{} {}", principal, frequency);
            assert!(schedule.is_paid_off());
            assert!((schedule.total_principal_paid - principal).abs() < dec!(0.000001));

            let last = schedule.entries.last().unwrap();
            assert_eq!(last.interest_paid + last.principal_paid, last.payment);
            assert!((last.payment - schedule.fixed_payment).abs() < dec!(0.000001));
        }
    }

    #[test]
    fn longer_window_stops_at_full_term() {
        let loan = loan(dec!(450000), dec!(6.2), 30, RepaymentFrequency::Fortnightly, 1000);
        let schedule = generate_schedule(&loan, None).unwrap();
        assert_eq!(schedule.entries.len(), 780);
        assert!(schedule.is_paid_off());
    }

    #[test]
    fn oversized_amounts_reported_not_panicking() {
        let mut huge_extra = loan(dec!(300000), dec!(6), 30, RepaymentFrequency::Weekly, 1560);
        huge_extra.extra_repayment_per_period = Decimal::MAX;
        assert_eq!(
            generate_schedule(&huge_extra, None),
            Err(InvalidInputError::AmountOverflow("scheduled payment"))
        );

        let short = loan(dec!(1000), Decimal::ZERO, 1, RepaymentFrequency::Weekly, 4);
        let profile = rental(Decimal::ZERO, "2024-01-01", Decimal::ZERO, &[Decimal::MAX]);
        assert_eq!(
            generate_schedule(&short, Some(&profile)),
            Err(InvalidInputError::AmountOverflow("net cash flow"))
        );
    }

    #[test]
    fn shorter_window_keeps_full_term_payment() {
        let full = loan(dec!(300000), dec!(6), 30, RepaymentFrequency::Weekly, 1560);
        let window = loan(dec!(300000), dec!(6), 30, RepaymentFrequency::Weekly, 52);

        let full = generate_schedule(&full, None).unwrap();
        let window = generate_schedule(&window, None).unwrap();

        assert_eq!(window.entries.len(), 52);
        assert_eq!(window.fixed_payment, full.fixed_payment);
        assert_eq!(window.entries[..], full.entries[..52]);
        assert!(window.final_balance() > dec!(290000));
    }

    #[test]
    fn rerun_is_identical() {
        let loan = loan(dec!(250000), dec!(5.75), 25, RepaymentFrequency::Fortnightly, 200);
        let profile = rental(dec!(900), "2024-03-01", dec!(8), &[dec!(40), dec!(25)]);
        let first = generate_schedule(&loan, Some(&profile)).unwrap();
        let second = generate_schedule(&loan, Some(&profile)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn final_period_clamped_to_balance() {
        // 150 of principal each period leaves 120 owing before the last payment
        let mut loan = loan(dec!(270), Decimal::ZERO, 1, RepaymentFrequency::Monthly, 12);
        loan.extra_repayment_per_period = dec!(127.5);
        let schedule = generate_schedule(&loan, None).unwrap();

        assert_eq!(schedule.entries.len(), 2);
        assert_eq!(schedule.entries[0].principal_paid, dec!(150));
        assert_eq!(schedule.entries[0].remaining_balance, dec!(120));

        let last = &schedule.entries[1];
        assert_eq!(last.principal_paid, dec!(120));
        assert_eq!(last.payment, last.interest_paid + dec!(120));
        assert_eq!(last.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn final_period_clamped_with_interest() {
        let mut loan = loan(dec!(10000), dec!(5), 1, RepaymentFrequency::Monthly, 12);
        loan.extra_repayment_per_period = dec!(3000);
        let schedule = generate_schedule(&loan, None).unwrap();

        let n = schedule.entries.len();
        assert!(n < 12);
        let last = &schedule.entries[n - 1];
        let owed = schedule.entries[n - 2].remaining_balance;
        assert_eq!(last.principal_paid, owed);
        assert_eq!(last.payment, last.interest_paid + owed);
        assert!(last.payment < schedule.fixed_payment + dec!(3000));
        assert_eq!(last.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn zero_principal_stops_after_first_period() {
        let loan = loan(Decimal::ZERO, dec!(6), 30, RepaymentFrequency::Weekly, 100);
        let schedule = generate_schedule(&loan, None).unwrap();
        assert_eq!(schedule.entries.len(), 1);
        assert_eq!(schedule.entries[0].payment, Decimal::ZERO);
    }

    #[test]
    fn invalid_input_returns_no_schedule() {
        let mut bad = loan(dec!(-5), dec!(6), 30, RepaymentFrequency::Weekly, 10);
        assert_eq!(
            generate_schedule(&bad, None),
            Err(InvalidInputError::NegativePrincipal(dec!(-5)))
        );

        bad.principal = dec!(1000);
        bad.schedule_length_periods = 0;
        assert_eq!(
            generate_schedule(&bad, None),
            Err(InvalidInputError::ZeroScheduleLength)
        );

        let good = loan(dec!(1000), dec!(6), 30, RepaymentFrequency::Weekly, 10);
        let early_rent = rental(dec!(500), "2023-06-01", dec!(0), &[]);
        assert!(matches!(
            generate_schedule(&good, Some(&early_rent)),
            Err(InvalidInputError::RentStartsBeforeLoan { .. })
        ));
    }

    #[test]
    fn break_even_geared_at_first_period() {
        // 20800 over one year of weekly repayments at 0% is 400/week
        let loan = loan(dec!(20800), Decimal::ZERO, 1, RepaymentFrequency::Weekly, 52);
        let profile = rental(dec!(500), "2024-01-01", dec!(10), &[dec!(50)]);
        let schedule = generate_schedule(&loan, Some(&profile)).unwrap();

        let first = schedule.entries[0].rental.as_ref().unwrap();
        assert_eq!(schedule.entries[0].payment, dec!(400));
        assert_eq!(first.rent_income, dec!(500));
        assert_eq!(first.agent_fee, dec!(50));
        assert_eq!(first.other_costs, dec!(50));
        assert_eq!(first.net_cash_flow, Decimal::ZERO);
        assert_eq!(
            schedule.positive_gearing,
            Some(GearingPoint {
                period_index: 1,
                date: date("2024-01-01"),
            })
        );
    }

    #[test]
    fn agent_fee_charged_before_rent_starts() {
        let loan = loan(dec!(20800), Decimal::ZERO, 1, RepaymentFrequency::Weekly, 52);
        let profile = rental(dec!(500), "2024-01-15", dec!(10), &[dec!(50)]);
        let schedule = generate_schedule(&loan, Some(&profile)).unwrap();

        let week1 = schedule.entries[0].rental.as_ref().unwrap();
        assert_eq!(week1.rent_income, Decimal::ZERO);
        assert_eq!(week1.agent_fee, dec!(50));
        assert_eq!(week1.net_cash_flow, dec!(-500));

        let week3 = schedule.entries[2].rental.as_ref().unwrap();
        assert_eq!(week3.rent_income, dec!(500));
        assert_eq!(
            schedule.positive_gearing,
            Some(GearingPoint {
                period_index: 3,
                date: date("2024-01-15"),
            })
        );
    }

    #[test]
    fn geared_on_reduced_final_payment() {
        // 300 a period, so the fourth payment is the 140 remainder
        let mut loan = loan(dec!(1040), Decimal::ZERO, 1, RepaymentFrequency::Weekly, 52);
        loan.extra_repayment_per_period = dec!(280);
        let profile = rental(dec!(250), "2024-01-01", Decimal::ZERO, &[]);
        let schedule = generate_schedule(&loan, Some(&profile)).unwrap();

        assert_eq!(schedule.entries.len(), 4);
        assert_eq!(schedule.entries[3].payment, dec!(140));
        let point = schedule.positive_gearing.unwrap();
        assert_eq!(point.period_index, 4);
        assert!(schedule.entries[..3]
            .iter()
            .all(|e| e.net_cash_flow().unwrap() < Decimal::ZERO));
    }

    #[test]
    fn never_geared() {
        let loan = loan(dec!(300000), dec!(6), 30, RepaymentFrequency::Weekly, 520);
        let profile = rental(dec!(350), "2024-01-01", dec!(7), &[dec!(60)]);
        let schedule = generate_schedule(&loan, Some(&profile)).unwrap();
        assert_eq!(schedule.positive_gearing, None);
        assert!(schedule.total_net_cash_flow().unwrap() < Decimal::ZERO);
    }

    #[test]
    fn only_first_crossing_reported() {
        let make = |index: u32, net: Decimal| ScheduleEntry {
            period_index: index,
            date: date("2024-01-01") + Duration::days(7 * i64::from(index - 1)),
            payment: dec!(400),
            interest_paid: dec!(300),
            principal_paid: dec!(100),
            remaining_balance: dec!(1000),
            rental: Some(RentalCashFlow {
                rent_income: dec!(400) + net,
                agent_fee: Decimal::ZERO,
                other_costs: Decimal::ZERO,
                net_cash_flow: net,
            }),
        };
        let entries = vec![
            make(1, dec!(-20)),
            make(2, dec!(5)),
            make(3, dec!(-1)),
            make(4, dec!(30)),
        ];
        let point = find_positive_gearing_point(&entries).unwrap();
        assert_eq!(point.period_index, 2);
        assert_eq!(point.date, date("2024-01-08"));
    }

    #[test]
    fn no_rental_means_no_gearing_point() {
        let loan = loan(dec!(1000), Decimal::ZERO, 1, RepaymentFrequency::Monthly, 12);
        let schedule = generate_schedule(&loan, None).unwrap();
        assert!(!schedule.has_rental());
        assert_eq!(schedule.positive_gearing, None);
        assert_eq!(schedule.total_net_cash_flow(), None);
    }
}
