// tests/unit_tests.rs
use approx::assert_relative_eq;
use gdal::raster::Buffer;
use sr_composite::aoi::Aoi;
use sr_composite::collection::Platform;
use sr_composite::image::{cell_count, Band, GeoInfo, Image};
use sr_composite::processing::clip::clip;
use sr_composite::processing::indices::{
    arvi::arvi, default_indices, evi::evi, gci::gci, ndvi::ndvi, savi::savi, vari::vari, ARVI,
    EVI, GCI, NDVI, SAVI, VARI,
};
use sr_composite::processing::mask::{mask_and_scale, QaMask, ReflectanceScale};
use sr_composite::processing::{add_index, IndexCalculator, Reducer};
use sr_composite::Error;

/// Helper function to build an image on a small EPSG:4326 grid
fn create_test_image(width: usize, height: usize, bands: &[(&str, &[f32])]) -> Image {
    let geo = GeoInfo {
        projection: String::new(),
        geo_transform: [0.0, 1.0, 0.0, height as f64, 0.0, -1.0],
        width,
        height,
    };
    let mut image = Image::new("test", geo);
    for (name, values) in bands {
        // Fill with test data (repeating pattern if needed)
        let data = (0..width * height).map(|i| values[i % values.len()]).collect();
        image
            .add_band(Band::from_vec(*name, (width, height), data))
            .unwrap();
    }
    image
}

fn reflectance_image() -> Image {
    create_test_image(
        2,
        2,
        &[
            ("blue", &[0.1]),
            ("green", &[0.3]),
            ("red", &[0.2]),
            ("nir", &[0.5]),
        ],
    )
}

#[test]
fn test_index_formulas_known_values() {
    let (nir, red, blue, green) = (0.5, 0.2, 0.1, 0.3);
    assert_relative_eq!(ndvi(nir, red), 0.428_571, epsilon = 1e-5);
    assert_relative_eq!(savi(nir, red, 0.5), 0.375, epsilon = 1e-5);
    assert_relative_eq!(evi(nir, red, blue), 0.384_615, epsilon = 1e-5);
    assert_relative_eq!(gci(nir, green), 0.666_667, epsilon = 1e-5);
    assert_relative_eq!(arvi(nir, red, blue), 0.25, epsilon = 1e-5);
    assert_relative_eq!(vari(green, red, blue), 0.25, epsilon = 1e-5);
}

#[test]
fn test_zero_denominator_gives_zero_quotient() {
    assert_eq!(ndvi(0.0, 0.0), 0.0);
    // nir / green is 0, so GCI sits at -1
    assert_eq!(gci(0.4, 0.0), -1.0);
    assert_eq!(vari(0.2, 0.2, 0.4), 0.0);
    assert!(ndvi(f32::NAN, 0.2).is_nan());
    assert!(gci(f32::NAN, 0.0).is_nan());
}

#[test]
fn test_ndvi_bounded_for_reflectance() {
    let steps: Vec<f32> = (0..=20).map(|i| i as f32 / 20.0).collect();
    for &nir in &steps {
        for &red in &steps {
            let v = ndvi(nir, red);
            assert!((-1.0..=1.0).contains(&v), "NDVI {v} out of range for {nir}, {red}");
        }
    }
}

/// Test that each calculator adds one band and leaves the rest untouched
#[test]
fn test_add_index_appends_exactly_one_band() {
    let image = reflectance_image();
    let before: Vec<(String, Vec<f32>)> = image
        .bands()
        .iter()
        .map(|b| (b.name().to_string(), b.data().to_vec()))
        .collect();

    for calculator in default_indices() {
        let out = add_index(image.clone(), calculator.as_ref()).unwrap();
        assert_eq!(out.bands().len(), before.len() + 1);
        assert_eq!(out.bands().last().unwrap().name(), calculator.name());
        for ((name, data), band) in before.iter().zip(out.bands()) {
            assert_eq!(name, band.name());
            assert_eq!(data.as_slice(), band.data());
        }
    }
}

#[test]
fn test_default_indices_order() {
    let image = default_indices()
        .iter()
        .try_fold(reflectance_image(), |img, calc| add_index(img, calc.as_ref()))
        .unwrap();
    assert_eq!(
        image.band_names(),
        ["blue", "green", "red", "nir", "NDVI", "SAVI", "EVI", "GCI", "ARVI", "VARI"]
    );
    assert_relative_eq!(image.band("EVI").unwrap().data()[3], 0.384_615, epsilon = 1e-5);
}

#[test]
fn test_add_index_rejects_duplicates_and_missing_inputs() {
    let image = add_index(reflectance_image(), &NDVI::new(None)).unwrap();
    assert!(matches!(
        add_index(image, &NDVI::new(None)),
        Err(Error::DuplicateBand { .. })
    ));

    let no_blue = create_test_image(1, 1, &[("nir", &[0.5]), ("red", &[0.2])]);
    match add_index(no_blue, &EVI::new(None)) {
        Err(Error::MissingBand { band, .. }) => assert_eq!(band, "blue"),
        other => panic!("expected MissingBand, got {other:?}"),
    }
}

/// Test that custom names are properly set
#[test]
fn test_custom_index_names() {
    assert_eq!(NDVI::new(Some("ndvi_custom".into())).name(), "ndvi_custom");
    assert_eq!(SAVI::new(0.5, Some("savi_l05".into())).name(), "savi_l05");
    assert_eq!(GCI::new(None).name(), "GCI");
    assert_eq!(ARVI::new(None).name(), "ARVI");
    assert_eq!(VARI::new(None).name(), "VARI");

    let ndvi_green = NDVI::with_bands("nir", "green", Some("GNDVI".into()));
    assert_eq!(ndvi_green.input_bands(), ["nir", "green"]);
}

/// Test that required_bands returns the correct number for each calculator
#[test]
fn test_required_bands() {
    assert_eq!(NDVI::new(None).required_bands(), 2);
    assert_eq!(SAVI::new(0.5, None).required_bands(), 2);
    assert_eq!(EVI::new(None).required_bands(), 3);
    assert_eq!(GCI::new(None).required_bands(), 2);
    assert_eq!(ARVI::new(None).required_bands(), 3);
    assert_eq!(VARI::new(None).required_bands(), 3);
}

#[test]
fn test_savi_soil_factor() {
    let savi_calc = SAVI::new(1.0, None);
    let nir = Buffer::new((1, 1), vec![0.5f32]);
    let red = Buffer::new((1, 1), vec![0.2f32]);
    let result = savi_calc.calculate(&[&nir, &red]);
    // 2.0 * 0.3 / 1.7
    assert_relative_eq!(result.data()[0], 0.352_941, epsilon = 1e-5);
}

#[test]
fn test_landsat_mask_bits() {
    // bit 3 and bit 5 mask, bits 2 and 4 do not
    let qa = [0.0, 8.0, 32.0, 16.0, 4.0, 40.0];
    let radsat = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    let image = create_test_image(
        6,
        1,
        &[("QA_PIXEL", &qa), ("QA_RADSAT", &radsat), ("SR_B2", &[10000.0])],
    );
    let keep = QaMask::landsat8().clear_pixels(&image).unwrap();
    assert_eq!(keep, [true, false, false, true, true, false]);
}

#[test]
fn test_landsat_saturation_mask() {
    let image = create_test_image(
        3,
        1,
        &[("QA_PIXEL", &[0.0]), ("QA_RADSAT", &[0.0, 2.0, 0.0]), ("SR_B2", &[10000.0])],
    );
    let keep = QaMask::landsat8().clear_pixels(&image).unwrap();
    assert_eq!(keep, [true, false, true]);
}

#[test]
fn test_sentinel_mask_bits() {
    // bit 10 cloud, bit 11 cirrus; bits 9 and 12 pass
    let qa = [0.0, 1024.0, 2048.0, 512.0, 4096.0, f32::NAN];
    let image = create_test_image(6, 1, &[("QA60", &qa)]);
    let keep = QaMask::sentinel2().clear_pixels(&image).unwrap();
    assert_eq!(keep, [true, false, false, true, true, false]);
    assert_eq!(QaMask::sentinel2().bitmask(), (1 << 10) | (1 << 11));
    assert_eq!(QaMask::landsat8().bitmask(), (1 << 3) | (1 << 5));
}

#[test]
fn test_landsat_scaling() {
    let image = create_test_image(
        2,
        1,
        &[
            ("QA_PIXEL", &[0.0, 8.0]),
            ("QA_RADSAT", &[0.0]),
            ("SR_B2", &[10000.0]),
            ("ST_B10", &[40000.0]),
        ],
    );
    let platform = Platform::Landsat8;
    let out = mask_and_scale(&platform.qa_mask(), &platform.reflectance_scale(), image).unwrap();

    let blue = out.band("SR_B2").unwrap().data();
    assert_relative_eq!(blue[0], 0.075, epsilon = 1e-5);
    assert!(blue[1].is_nan());

    let thermal = out.band("ST_B10").unwrap().data();
    assert_relative_eq!(thermal[0], 285.7208, epsilon = 1e-2);
    // QA bands are not rescaled
    assert_eq!(out.band("QA_RADSAT").unwrap().data()[0], 0.0);
}

#[test]
fn test_sentinel_scaling_divides_all_bands() {
    let image = create_test_image(1, 1, &[("QA60", &[0.0]), ("B4", &[2000.0])]);
    let out = mask_and_scale(&QaMask::sentinel2(), &ReflectanceScale::sentinel2(), image).unwrap();
    assert_relative_eq!(out.band("B4").unwrap().data()[0], 0.2, epsilon = 1e-6);
}

#[test]
fn test_select_rename_uses_band_table() {
    let image = create_test_image(1, 1, &[("B2", &[1.0]), ("B8", &[2.0]), ("B4", &[3.0])]);
    let renamed = image
        .select_rename(&[("B2", "blue"), ("B4", "red"), ("B8", "nir")])
        .unwrap();
    assert_eq!(renamed.band_names(), ["blue", "red", "nir"]);
    assert_eq!(renamed.band("nir").unwrap().data()[0], 2.0);
    assert!(image.select(&["B3"]).is_err());
}

#[test]
fn test_reducers_skip_masked_pixels() {
    let nan = f32::NAN;
    let images: Vec<Image> = [
        [1.0, nan, 5.0, nan],
        [3.0, nan, 1.0, 2.0],
        [8.0, nan, 3.0, nan],
        [4.0, nan, 7.0, nan],
    ]
    .iter()
    .map(|values| create_test_image(4, 1, &[("NDVI", values)]))
    .collect();

    let reduce = |r: Reducer| r.reduce(&images, &["NDVI"]).unwrap().band("NDVI").unwrap().data().to_vec();

    let mean = reduce(Reducer::Mean);
    assert_relative_eq!(mean[0], 4.0);
    assert!(mean[1].is_nan());
    assert_relative_eq!(mean[2], 4.0);
    assert_relative_eq!(mean[3], 2.0);

    // even count: average of the two middle values
    let median = reduce(Reducer::Median);
    assert_relative_eq!(median[0], 3.5);
    assert_relative_eq!(median[2], 4.0);
    assert!(median[1].is_nan());

    assert_eq!(reduce(Reducer::Min)[0], 1.0);
    assert_eq!(reduce(Reducer::Max)[0], 8.0);
    assert_eq!(reduce(Reducer::Max)[3], 2.0);
}

#[test]
fn test_reduce_requires_images_and_bands() {
    assert!(matches!(
        Reducer::Mean.reduce(&[], &["NDVI"]),
        Err(Error::EmptyCollection(_))
    ));
    let images = vec![create_test_image(1, 1, &[("NDVI", &[0.1])])];
    assert!(Reducer::Max.reduce(&images, &["EVI"]).is_err());
}

#[test]
fn test_clip_masks_outside_aoi() {
    // 4x4 grid over lon 0..4, lat 0..4; AOI covers the lower-left 2x2 block
    let image = create_test_image(4, 4, &[("EVI", &[0.5])]);
    let aoi = Aoi::from_bounds(0.0, 0.0, 2.0, 2.0).unwrap();
    let clipped = clip(image, &aoi).unwrap();
    let data = clipped.band("EVI").unwrap().data();

    for row in 0..4 {
        for col in 0..4 {
            let value = data[row * 4 + col];
            if row >= 2 && col < 2 {
                assert_eq!(value, 0.5, "pixel ({col}, {row}) should be kept");
            } else {
                assert!(value.is_nan(), "pixel ({col}, {row}) should be masked");
            }
        }
    }
    assert_eq!(clipped.band_names(), ["EVI"]);
}

#[test]
fn test_grid_helpers() {
    let geo = GeoInfo::from_bounds([10.0, 44.0, 10.5, 44.25], 0.1, String::new());
    assert_eq!(geo.shape(), (5, 3));
    assert_eq!(geo.geo_transform, [10.0, 0.1, 0.0, 44.25, 0.0, -0.1]);
    let (x, y) = geo.pixel_center(0, 0);
    assert_relative_eq!(x, 10.05, epsilon = 1e-9);
    assert_relative_eq!(y, 44.2, epsilon = 1e-9);
    assert!(geo.same_grid(&geo.clone()));
}

#[test]
fn test_grid_size_ignores_float_noise() {
    // (45.0 - 44.992) / 0.001 is a hair above 8
    let geo = GeoInfo::from_bounds([10.0, 44.992, 10.008, 45.0], 111.31949 / 111_319.49, String::new());
    assert_eq!(geo.shape(), (8, 8));
    assert_eq!(cell_count(0.3, 0.1), 3.0);
    assert_eq!(cell_count(0.35, 0.1), 4.0);
    assert_eq!(cell_count(0.0, 1.0), 1.0);
}
