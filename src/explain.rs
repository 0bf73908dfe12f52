use std::fmt::Write;

use crate::models::Regression;

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

pub fn correlation_strength(correlation: f64) -> &'static str {
    let magnitude = correlation.abs();
    if magnitude > 0.7 {
        "a strong"
    } else if magnitude > 0.3 {
        "a moderate"
    } else {
        "a weak"
    }
}

pub fn correlation_explainer(correlation: Option<f64>) -> String {
    match correlation {
        Some(value) => format!(
            "The correlation coefficient of {value:.2} suggests {} linear relationship between \
             attendance percentage and final marks. A positive value indicates that higher \
             attendance is associated with higher marks, while a negative value suggests the \
             opposite.",
            correlation_strength(value)
        ),
        None => "The correlation coefficient could not be calculated: at least two paired \
                 observations with varying attendance and marks are required."
            .to_string(),
    }
}

pub fn regression_explainer(regression: Option<&Regression>) -> String {
    let Some(fit) = regression else {
        return "A line of best fit could not be calculated: at least two paired observations \
                with different attendance percentages are required."
            .to_string();
    };

    let mut output = String::new();
    let _ = write!(
        output,
        "The slope ({:.2}) indicates that for each additional percentage point in attendance, \
         the model predicts a {:.2} point increase in the final mark.\n\n",
        fit.slope, fit.slope
    );
    let _ = write!(
        output,
        "The intercept ({:.2}) suggests that students with zero percent attendance are predicted \
         to score {:.2} points, which may not be realistic and indicates the intercept's value in \
         this context should be cautiously interpreted.\n\n",
        fit.intercept, fit.intercept
    );
    let _ = write!(
        output,
        "An R-value of {:.2} results in an R-squared (coefficient of determination) of {:.2}, \
         indicating the proportion of the variance in the dependent variable (final mark) that \
         is predictable from the independent variable (attendance percentage).\n\n",
        fit.r_value,
        fit.r_value.powi(2)
    );
    if fit.p_value < SIGNIFICANCE_LEVEL {
        let _ = write!(
            output,
            "With a P-value of {:.4}, the relationship between attendance and final marks is \
             statistically significant, meaning there's a low probability that this relationship \
             is due to chance.\n\n",
            fit.p_value
        );
    } else {
        let _ = write!(
            output,
            "With a P-value of {:.4}, the relationship between attendance and final marks is not \
             statistically significant, suggesting that any observed correlation may be due to \
             chance.\n\n",
            fit.p_value
        );
    }
    let _ = write!(
        output,
        "The standard error of the slope ({:.2}) measures the average distance that the observed \
         values fall from the regression line. A lower standard error indicates that the slope \
         estimate is more precise.\n\n",
        fit.std_err
    );

    output
}
