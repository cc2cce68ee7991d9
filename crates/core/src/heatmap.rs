//! Disease incidence by Indian state.
//!
//! The figures are a fixed reference table compiled into the binary. Callers only see the
//! [`stats`] and [`diseases`] functions, so the table can later move into the store without
//! changing the response shape.

use crate::error::{CoreError, CoreResult};
use api_shared::{HeatmapStatsRes, StateCases};

const STATES: [&str; 20] = [
    "Maharashtra",
    "Karnataka",
    "Tamil Nadu",
    "Delhi",
    "Gujarat",
    "Rajasthan",
    "West Bengal",
    "Uttar Pradesh",
    "Madhya Pradesh",
    "Kerala",
    "Punjab",
    "Haryana",
    "Bihar",
    "Andhra Pradesh",
    "Telangana",
    "Odisha",
    "Assam",
    "Jharkhand",
    "Chhattisgarh",
    "Uttarakhand",
];

/// Case counts per disease, in `STATES` order.
const DISEASES: [(&str, [u64; 20]); 7] = [
    (
        "Acne",
        [
            1250, 980, 875, 720, 650, 580, 520, 890, 450, 620, 380, 410, 520, 680, 590, 340, 280,
            310, 270, 240,
        ],
    ),
    (
        "Eczema",
        [
            890, 720, 650, 580, 540, 420, 680, 750, 380, 490, 520, 460, 590, 520, 480, 410, 350,
            290, 310, 280,
        ],
    ),
    (
        "Psoriasis",
        [
            620, 540, 480, 450, 410, 520, 380, 590, 340, 360, 480, 420, 410, 390, 370, 280, 240,
            260, 230, 210,
        ],
    ),
    (
        "Rosacea",
        [
            380, 340, 310, 420, 290, 260, 320, 350, 240, 280, 310, 290, 270, 260, 250, 190, 160,
            180, 170, 150,
        ],
    ),
    (
        "Melanoma",
        [
            180, 160, 150, 140, 130, 120, 110, 170, 95, 125, 105, 115, 100, 135, 120, 85, 70, 75,
            65, 60,
        ],
    ),
    (
        "Vitiligo",
        [
            520, 450, 410, 380, 490, 360, 430, 480, 310, 340, 290, 320, 350, 380, 360, 270, 230,
            250, 220, 190,
        ],
    ),
    (
        "Dermatitis",
        [
            740, 680, 620, 590, 550, 480, 610, 690, 420, 510, 460, 490, 520, 560, 530, 380, 320,
            340, 310, 270,
        ],
    ),
];

/// Disease names available in the table.
pub fn diseases() -> Vec<&'static str> {
    DISEASES.iter().map(|(name, _)| *name).collect()
}

/// Per-state breakdown for `disease` (exact, case-sensitive match).
pub fn stats(disease: &str) -> CoreResult<HeatmapStatsRes> {
    let (name, counts) = DISEASES
        .iter()
        .find(|(name, _)| *name == disease)
        .ok_or_else(|| CoreError::not_found("Disease not found"))?;

    let data: Vec<StateCases> = STATES
        .iter()
        .zip(counts.iter())
        .map(|(state, cases)| StateCases {
            state: (*state).to_owned(),
            cases: *cases,
        })
        .collect();

    Ok(HeatmapStatsRes {
        disease: (*name).to_owned(),
        total: counts.iter().sum(),
        states_count: data.len(),
        data,
    })
}
