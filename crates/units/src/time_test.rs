mod tests {
    use approx::assert_relative_eq;

    use crate::time::{MYR_TO_SECONDS, SECONDS_PER_YEAR, Time};

    #[test]
    fn test_time_conversions() {
        let time_myr = Time::from_myr(1.0);
        assert_relative_eq!(time_myr.to_seconds(), MYR_TO_SECONDS);
        assert_relative_eq!(time_myr.to_years(), 1.0e6);

        let time_seconds = Time::from_seconds(SECONDS_PER_YEAR);
        assert_relative_eq!(time_seconds.to_years(), 1.0);

        assert_relative_eq!(Time::from_gyr(0.25).to_myr(), 250.0);
        assert_relative_eq!(Time::from_myr(1500.0).to_gyr(), 1.5);
    }

    #[test]
    fn test_time_accumulation() {
        let mut t = Time::zero();
        let dt = Time::from_myr(0.5);
        for _ in 0..4 {
            t += dt;
        }
        assert_relative_eq!(t.to_myr(), 2.0);
        assert_relative_eq!(t / dt, 4.0);
        assert_relative_eq!((t - dt).to_myr(), 1.5);
    }
}
