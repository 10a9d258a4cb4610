mod tests {
    use approx::assert_relative_eq;

    use crate::length::{KPC_TO_KM, Length};

    #[test]
    fn test_length_conversions() {
        let length_kpc = Length::from_kpc(1.0);
        assert_relative_eq!(length_kpc.to_km(), KPC_TO_KM);
        assert_relative_eq!(length_kpc.to_pc(), 1_000.0);

        let length_km = Length::from_km(KPC_TO_KM);
        assert_relative_eq!(length_km.to_kpc(), 1.0);

        // One parsec is roughly 206265 AU
        assert_relative_eq!(Length::from_pc(1.0).to_au(), 206_264.8, epsilon = 0.1);

        let original = 5.7;
        let round_trip = Length::from_meters(Length::from_kpc(original).to_m()).to_kpc();
        assert_relative_eq!(round_trip, original);
    }

    #[test]
    fn test_length_arithmetic_operations() {
        let length1 = Length::from_kpc(5.0);
        let length2 = Length::from_kpc(3.0);

        assert_relative_eq!((length1 + length2).to_kpc(), 8.0);
        assert_relative_eq!((length1 - length2).to_kpc(), 2.0);
        assert_relative_eq!((-length1).to_kpc(), -5.0);
        assert_relative_eq!((length1 * 2.0).to_kpc(), 10.0);
        assert_relative_eq!((length1 / 2.0).to_kpc(), 2.5);
        assert_relative_eq!((1.5 * length1).to_kpc(), 7.5);
        assert_relative_eq!(length1 / length2, 5.0 / 3.0);
    }

    #[test]
    fn test_length_min_max() {
        let length1 = Length::from_kpc(5.0);
        let length2 = Length::from_kpc(3.0);

        assert_relative_eq!(length1.min(length2).to_kpc(), 3.0);
        assert_relative_eq!(length2.max(length1).to_kpc(), 5.0);
        assert_relative_eq!(Length::from_kpc(-2.0).abs().to_kpc(), 2.0);
    }
}
