use crate::{
    endpoint::{Endpoint, EndpointEstimator},
    error::Result,
    histogram::AmpHistogram,
    metadata::{NamingConvention, SampleMeta},
    source::NamedHistogram,
};

/// One histogram with everything derived from it.
///
/// Metadata and endpoint are computed on construction; the time offset
/// inside a batch lives in [`crate::aggregate::Batch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub histogram: AmpHistogram,
    pub meta: SampleMeta,
    pub endpoint: Endpoint,
}

impl Measurement {
    pub fn new(
        named: NamedHistogram,
        convention: NamingConvention,
        estimator: &EndpointEstimator,
    ) -> Result<Self> {
        let NamedHistogram { name, histogram } = named;
        let meta = convention.parse(&name)?;
        let endpoint = estimator.estimate(&name, &histogram)?;
        Ok(Measurement {
            name,
            histogram,
            meta,
            endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    fn named(name: &str, counts: Vec<u64>) -> NamedHistogram {
        NamedHistogram {
            name: name.to_owned(),
            histogram: AmpHistogram::from_channels(counts),
        }
    }

    #[test]
    fn derives_meta_and_endpoint() {
        let measurement = Measurement::new(
            named("010117_5_TEST_12_A", vec![0, 0, 90, 0]),
            NamingConvention::TokenCount,
            &EndpointEstimator::default(),
        )
        .unwrap();
        assert_eq!(measurement.meta.identifier, "12A");
        assert_eq!(measurement.endpoint.median, 2.0);
    }

    #[test]
    fn bad_name_fails_before_estimation() {
        let err = Measurement::new(
            named("010117_TEST_12", vec![0; 4]),
            NamingConvention::TokenCount,
            &EndpointEstimator::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::NamingConvention { .. }));
    }
}
