mod tests {
    use approx::assert_relative_eq;

    use crate::velocity::{G_GALACTIC, KMS_TO_KPC_PER_MYR, Velocity, circular_velocity};
    use crate::{Length, Mass, Time};

    #[test]
    fn test_velocity_conversions() {
        // 1 km/s is close to 1.0227 pc/Myr
        assert_relative_eq!(KMS_TO_KPC_PER_MYR, 1.0227e-3, epsilon = 1e-6);

        let v = Velocity::from_kpc_per_myr(1.0);
        assert_relative_eq!(v.to_kpc_per_myr(), 1.0);
        assert_relative_eq!(v.to_kms(), 977.8, epsilon = 0.1);

        assert_relative_eq!(Velocity::from_meters_per_sec(2_500.0).to_kms(), 2.5);
    }

    #[test]
    fn test_gravitational_constant() {
        assert_relative_eq!(G_GALACTIC, 4.302e-6, epsilon = 1e-9);
    }

    #[test]
    fn test_circular_velocity() {
        let v = circular_velocity(Mass::from_solar_masses(1.0e11), Length::from_kpc(10.0));
        assert_relative_eq!(v.to_kms(), 207.4, epsilon = 0.1);
    }

    #[test]
    fn test_distance_from_velocity_and_time() {
        let distance = Velocity::from_kms(977.8) * Time::from_myr(2.0);
        assert_relative_eq!(distance.to_kpc(), 2.0, epsilon = 1e-3);
    }
}
