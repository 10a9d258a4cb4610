mod tests {
    use approx::assert_relative_eq;

    use crate::{Dimension, Length, Quantity, Unit, UnitError, Velocity};

    #[test]
    fn test_incompatible_addition_fails() {
        let length = Quantity::new(1.0, &Unit::kpc());
        let mass = Quantity::new(1.0, &Unit::msun());

        let err = length.checked_add(mass).unwrap_err();
        assert_eq!(
            err,
            UnitError::Incompatible {
                left: Dimension::LENGTH,
                right: Dimension::MASS
            }
        );
        assert!(length.checked_sub(mass).is_err());
    }

    #[test]
    fn test_compatible_addition_converts() {
        let a = Quantity::new(1.0, &Unit::kpc());
        let b = Quantity::new(500.0, &Unit::parse("pc").unwrap());
        let sum = a.checked_add(b).unwrap();
        assert_relative_eq!(sum.value_in(&Unit::kpc()).unwrap(), 1.5);
    }

    #[test]
    fn test_products_combine_dimensions() {
        let v = Quantity::new(3.0, &Unit::kms());
        let energy = Quantity::new(2.0, &Unit::msun()) * v * v;
        assert_eq!(energy.dimension(), Dimension::ENERGY);

        let per_mass = energy / Quantity::new(2.0, &Unit::msun());
        assert_relative_eq!(per_mass.value_in(&Unit::kms_squared()).unwrap(), 9.0);

        let speed = per_mass.sqrt().unwrap();
        assert_relative_eq!(speed.value_in(&Unit::kms()).unwrap(), 3.0);
        assert!(Quantity::new(1.0, &Unit::kpc()).sqrt().is_err());
    }

    #[test]
    fn test_typed_conversions() {
        let q: Quantity = Length::from_kpc(2.0).into();
        let back = Length::try_from(q).unwrap();
        assert_relative_eq!(back.to_kpc(), 2.0);
        assert!(Velocity::try_from(q).is_err());
    }

    #[test]
    fn test_deserialize_value_with_unit() {
        let q: Quantity = serde_json::from_str(r#"{"value": 0.5, "unit": "Gyr"}"#).unwrap();
        assert_relative_eq!(q.value_in(&Unit::myr()).unwrap(), 500.0);
    }
}
