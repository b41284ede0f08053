/// Funding status category of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FundingBucket {
    Construction,
    Funded,
    PartiallyFunded,
    Unfunded,
}

impl FundingBucket {
    pub const ALL: [FundingBucket; 4] = [
        FundingBucket::Construction,
        FundingBucket::Funded,
        FundingBucket::PartiallyFunded,
        FundingBucket::Unfunded,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            FundingBucket::Construction => "construction",
            FundingBucket::Funded => "funded",
            FundingBucket::PartiallyFunded => "partially_funded",
            FundingBucket::Unfunded => "unfunded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.to_str() == s)
    }

    /// Suffix of the bucket's output columns, e.g. `Projects_PartialFunded`.
    pub fn suffix(&self) -> &'static str {
        match self {
            FundingBucket::Construction => "Construction",
            FundingBucket::Funded => "Funded",
            FundingBucket::PartiallyFunded => "PartialFunded",
            FundingBucket::Unfunded => "Unfunded",
        }
    }

    /// Classify a UTP funding status. Matching is on the trimmed, lowercased
    /// status: `funded` and `unfunded` exactly, anything containing `partial`.
    pub fn from_status(status: &str) -> Option<Self> {
        let status = status.trim().to_lowercase();
        match status.as_str() {
            "funded" => Some(FundingBucket::Funded),
            "unfunded" => Some(FundingBucket::Unfunded),
            s if s.contains("partial") => Some(FundingBucket::PartiallyFunded),
            _ => None,
        }
    }
}
