use crate::cost_signal::CostSample;

/// Mean of a fixed-size window of cost samples
///
/// Positions are rounded to the nearest integer, with ties rounding up.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothedSample {
    pub ref_pos: i64,
    pub query_pos: i64,
    pub cost: f64,
}

/// Integer mean of `sum` over `count` values, rounding half up
///
/// This is computed without floating point so that x.5 means round consistently.
///
fn round_half_up_mean(sum: i64, count: i64) -> i64 {
    assert!(count > 0);
    (2 * sum + count).div_euclid(2 * count)
}

/// Apply a sliding mean filter of size `window` to the cost signal
///
/// For a signal of length N, the result has length N - window, where element i is the mean of
/// signal samples [i, i + window). The result is empty when N <= window.
///
pub fn smooth_cost_signal(signal: &[CostSample], window: usize) -> Vec<SmoothedSample> {
    assert!(window > 0);

    let n = signal.len();
    if n <= window {
        return Vec::new();
    }

    let count = window as i64;
    let mut cost_sum = 0i64;
    let mut ref_sum = 0i64;
    let mut query_sum = 0i64;
    for s in signal[..window].iter() {
        cost_sum += s.cost as i64;
        ref_sum += s.ref_pos;
        query_sum += s.query_pos;
    }

    let mut smoothed = Vec::with_capacity(n - window);
    for i in 0..(n - window) {
        if i > 0 {
            let (out, inc) = (&signal[i - 1], &signal[i + window - 1]);
            cost_sum += (inc.cost - out.cost) as i64;
            ref_sum += inc.ref_pos - out.ref_pos;
            query_sum += inc.query_pos - out.query_pos;
        }
        smoothed.push(SmoothedSample {
            ref_pos: round_half_up_mean(ref_sum, count),
            query_pos: round_half_up_mean(query_sum, count),
            cost: cost_sum as f64 / count as f64,
        });
    }
    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    fn get_signal(costs: &[i32]) -> Vec<CostSample> {
        costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| CostSample {
                ref_pos: 1000 + i as i64,
                query_pos: i as i64,
                cost,
            })
            .collect()
    }

    #[test]
    fn test_round_half_up_mean() {
        assert_eq!(round_half_up_mean(5, 2), 3);
        assert_eq!(round_half_up_mean(7, 2), 4);
        assert_eq!(round_half_up_mean(10, 4), 3);
        assert_eq!(round_half_up_mean(9, 4), 2);
        assert_eq!(round_half_up_mean(11, 4), 3);
        assert_eq!(round_half_up_mean(12, 4), 3);
    }

    #[test]
    fn test_short_signal() {
        let signal = get_signal(&[1, 1, 1]);
        assert!(smooth_cost_signal(&signal, 3).is_empty());
        assert!(smooth_cost_signal(&signal, 5).is_empty());
        assert_eq!(smooth_cost_signal(&signal, 2).len(), 1);
    }

    #[test]
    fn test_smooth_cost_signal() {
        let costs = [1, -2, -2, 1, 1, -1, 0, 1, 1, -2, 1];
        let signal = get_signal(&costs);
        let window = 4;
        let smoothed = smooth_cost_signal(&signal, window);

        assert_eq!(smoothed.len(), costs.len() - window);
        for (i, s) in smoothed.iter().enumerate() {
            let expect = costs[i..i + window].iter().sum::<i32>() as f64 / window as f64;
            assert_ulps_eq!(s.cost, expect, max_ulps = 4);

            // mean of i..i+4 is exactly i + 1.5, which rounds up
            assert_eq!(s.query_pos, i as i64 + 2);
            assert_eq!(s.ref_pos, 1000 + i as i64 + 2);
        }
    }

    #[test]
    fn test_position_rounding() {
        // Positions 0,0,1 have mean 1/3 and round down. Positions 0,1,1 have mean 2/3 and round up.
        let signal = [(0, 0), (0, 0), (1, 1), (1, 1), (0, 0)]
            .iter()
            .map(|&(ref_pos, query_pos)| CostSample {
                ref_pos,
                query_pos,
                cost: 0,
            })
            .collect::<Vec<_>>();
        let smoothed = smooth_cost_signal(&signal, 3);
        assert_eq!(smoothed.len(), 2);
        assert_eq!(smoothed[0].ref_pos, 0);
        assert_eq!(smoothed[1].query_pos, 1);

        // Query positions 0,1 have mean 0.5, which rounds up to 1
        let signal = get_signal(&[0, 0, 0]);
        let smoothed = smooth_cost_signal(&signal[..], 2);
        assert_eq!(smoothed.len(), 1);
        assert_eq!(smoothed[0].query_pos, 1);
    }
}
