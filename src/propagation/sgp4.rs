//! Near-Earth SGP4 (Hoots & Roehrich, Spacetrack Report #3, with the
//! Vallado 2006 revisions) on WGS-72 constants.
//!
//! Orbits with a period of 225 minutes or more need the SDP4 deep-space
//! terms and are rejected at initialization.

use crate::constants::*;
use crate::elements::OrbitalElementSet;
use crate::error::{Error, Result};
use crate::models::StateVector;
use crate::time;
use hifitime::Epoch;
use log::trace;
use nalgebra as na;

const X2O3: f64 = 2.0 / 3.0;

/// Initialized SGP4 model of one element set.
///
/// Initialization computes everything that does not depend on time, so each
/// [`Propagator::propagate`] call only evaluates the secular and periodic
/// terms for the requested instant.
#[derive(Debug, Clone)]
pub struct Propagator {
    elements: OrbitalElementSet,
    xke: f64,
    // mean elements at epoch (radians, radians/minute)
    ecco: f64,
    inclo: f64,
    nodeo: f64,
    argpo: f64,
    mo: f64,
    no: f64,
    bstar: f64,
    // drag
    isimp: bool,
    eta: f64,
    cc1: f64,
    cc4: f64,
    cc5: f64,
    d2: f64,
    d3: f64,
    d4: f64,
    delmo: f64,
    sinmao: f64,
    omgcof: f64,
    xmcof: f64,
    t2cof: f64,
    t3cof: f64,
    t4cof: f64,
    t5cof: f64,
    // secular rates
    mdot: f64,
    argpdot: f64,
    nodedot: f64,
    nodecf: f64,
    // long and short period
    con41: f64,
    x1mth2: f64,
    x7thm1: f64,
    xlcof: f64,
    aycof: f64,
}

impl Propagator {
    pub fn new(elements: &OrbitalElementSet) -> Result<Self> {
        let xke = 60.0 / (WGS72_RE.powi(3) / WGS72_MU).sqrt();
        let j3oj2 = WGS72_J3 / WGS72_J2;

        let ecco = elements.eccentricity;
        let inclo = elements.inclination_deg.to_radians();
        let no_kozai = elements.mean_motion * TWO_PI / MINUTES_PER_DAY;
        if no_kozai.is_nan() || no_kozai <= 0.0 || !(0.0..1.0).contains(&ecco) {
            return Err(Error::invalid_elements(format!(
                "mean motion {} rev/day with eccentricity {ecco} is not an orbit",
                elements.mean_motion
            )));
        }

        // Recover the original (un-Kozai) mean motion and semi-major axis
        let eccsq = ecco * ecco;
        let omeosq = 1.0 - eccsq;
        let rteosq = omeosq.sqrt();
        let cosio = inclo.cos();
        let cosio2 = cosio * cosio;
        let ak = (xke / no_kozai).powf(X2O3);
        let d1 = 0.75 * WGS72_J2 * (3.0 * cosio2 - 1.0) / (rteosq * omeosq);
        let mut del = d1 / (ak * ak);
        let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
        del = d1 / (adel * adel);
        let no = no_kozai / (1.0 + del);

        let period_minutes = TWO_PI / no;
        if period_minutes >= DEEP_SPACE_PERIOD_MINUTES {
            return Err(Error::DeepSpaceUnsupported { period_minutes });
        }

        let ao = (xke / no).powf(X2O3);
        let sinio = inclo.sin();
        let po = ao * omeosq;
        let con42 = 1.0 - 5.0 * cosio2;
        let con41 = -con42 - cosio2 - cosio2;
        let posq = po * po;
        let rp = ao * (1.0 - ecco);
        if rp < 1.0 {
            return Err(Error::invalid_elements(format!(
                "perigee {:.1} km is below the Earth's surface",
                (rp - 1.0) * WGS72_RE
            )));
        }

        // Perigees under 220 km drop the higher order drag terms
        let isimp = rp < 220.0 / WGS72_RE + 1.0;

        // Atmospheric density parameters, adjusted for low perigees
        let mut sfour = 78.0 / WGS72_RE + 1.0;
        let mut qzms24 = ((120.0 - 78.0) / WGS72_RE).powi(4);
        let perige = (rp - 1.0) * WGS72_RE;
        if perige < 156.0 {
            sfour = if perige < 98.0 { 20.0 } else { perige - 78.0 };
            qzms24 = ((120.0 - sfour) / WGS72_RE).powi(4);
            sfour = sfour / WGS72_RE + 1.0;
        }

        let pinvsq = 1.0 / posq;
        let tsi = 1.0 / (ao - sfour);
        let eta = ao * ecco * tsi;
        let etasq = eta * eta;
        let eeta = ecco * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qzms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);
        let cc2 = coef1
            * no
            * (ao * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.375 * WGS72_J2 * tsi / psisq * con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let bstar = elements.bstar;
        let cc1 = bstar * cc2;
        let cc3 = if ecco > 1.0e-4 {
            -2.0 * coef * tsi * j3oj2 * no * sinio / ecco
        } else {
            0.0
        };
        let x1mth2 = 1.0 - cosio2;
        let argpo = elements.arg_perigee_deg.to_radians();
        let cc4 = 2.0
            * no
            * coef1
            * ao
            * omeosq
            * (eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
                - WGS72_J2 * tsi / (ao * psisq)
                    * (-3.0 * con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75 * x1mth2 * (2.0 * etasq - eeta * (1.0 + etasq)) * (2.0 * argpo).cos()));
        let cc5 = 2.0 * coef1 * ao * omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

        // Secular rates from J2 and J4
        let cosio4 = cosio2 * cosio2;
        let temp1 = 1.5 * WGS72_J2 * pinvsq * no;
        let temp2 = 0.5 * temp1 * WGS72_J2 * pinvsq;
        let temp3 = -0.46875 * WGS72_J4 * pinvsq * pinvsq * no;
        let mdot = no
            + 0.5 * temp1 * rteosq * con41
            + 0.0625 * temp2 * rteosq * (13.0 - 78.0 * cosio2 + 137.0 * cosio4);
        let argpdot = -0.5 * temp1 * con42
            + 0.0625 * temp2 * (7.0 - 114.0 * cosio2 + 395.0 * cosio4)
            + temp3 * (3.0 - 36.0 * cosio2 + 49.0 * cosio4);
        let xhdot1 = -temp1 * cosio;
        let nodedot = xhdot1
            + (0.5 * temp2 * (4.0 - 19.0 * cosio2) + 2.0 * temp3 * (3.0 - 7.0 * cosio2)) * cosio;

        let mo = elements.mean_anomaly_deg.to_radians();
        let omgcof = bstar * cc3 * argpo.cos();
        let xmcof = if ecco > 1.0e-4 {
            -X2O3 * coef * bstar / eeta
        } else {
            0.0
        };
        let nodecf = 3.5 * omeosq * xhdot1 * cc1;
        let t2cof = 1.5 * cc1;
        // Guard the division for inclinations of exactly 180 degrees
        let xlcof_den = if (cosio + 1.0).abs() > 1.5e-12 {
            1.0 + cosio
        } else {
            1.5e-12
        };
        let xlcof = -0.25 * j3oj2 * sinio * (3.0 + 5.0 * cosio) / xlcof_den;
        let aycof = -0.5 * j3oj2 * sinio;
        let delmo = (1.0 + eta * mo.cos()).powi(3);
        let sinmao = mo.sin();
        let x7thm1 = 7.0 * cosio2 - 1.0;

        let (mut d2, mut d3, mut d4) = (0.0, 0.0, 0.0);
        let (mut t3cof, mut t4cof, mut t5cof) = (0.0, 0.0, 0.0);
        if !isimp {
            let cc1sq = cc1 * cc1;
            d2 = 4.0 * ao * tsi * cc1sq;
            let temp = d2 * tsi * cc1 / 3.0;
            d3 = (17.0 * ao + sfour) * temp;
            d4 = 0.5 * temp * ao * tsi * (221.0 * ao + 31.0 * sfour) * cc1;
            t3cof = d2 + 2.0 * cc1sq;
            t4cof = 0.25 * (3.0 * d3 + cc1 * (12.0 * d2 + 10.0 * cc1sq));
            t5cof = 0.2
                * (3.0 * d4 + 12.0 * cc1 * d3 + 6.0 * d2 * d2 + 15.0 * cc1sq * (2.0 * d2 + cc1sq));
        }

        Ok(Self {
            elements: elements.clone(),
            xke,
            ecco,
            inclo,
            nodeo: elements.raan_deg.to_radians(),
            argpo,
            mo,
            no,
            bstar,
            isimp,
            eta,
            cc1,
            cc4,
            cc5,
            d2,
            d3,
            d4,
            delmo,
            sinmao,
            omgcof,
            xmcof,
            t2cof,
            t3cof,
            t4cof,
            t5cof,
            mdot,
            argpdot,
            nodedot,
            nodecf,
            con41,
            x1mth2,
            x7thm1,
            xlcof,
            aycof,
        })
    }

    pub fn elements(&self) -> &OrbitalElementSet {
        &self.elements
    }

    pub fn epoch(&self) -> Epoch {
        self.elements.epoch
    }

    /// Period (minutes) from the recovered mean motion.
    pub fn period_minutes(&self) -> f64 {
        TWO_PI / self.no
    }

    /// State at an absolute instant.
    pub fn propagate(&self, epoch: Epoch) -> Result<StateVector> {
        let tsince = time::minutes_between(self.elements.epoch, epoch);
        trace!(
            "propagating {:05} to {epoch} ({tsince:.3} min)",
            self.elements.catalog_number
        );
        let (position, velocity) = self.propagate_minutes(tsince)?;
        Ok(StateVector::new(epoch, position, velocity))
    }

    /// TEME position (km) and velocity (km/s) `tsince` minutes from epoch.
    pub fn propagate_minutes(&self, tsince: f64) -> Result<(na::Vector3<f64>, na::Vector3<f64>)> {
        let t = tsince;
        let xke = self.xke;

        // Secular gravity and atmospheric drag
        let xmdf = self.mo + self.mdot * t;
        let argpdf = self.argpo + self.argpdot * t;
        let nodedf = self.nodeo + self.nodedot * t;
        let mut argpm = argpdf;
        let mut mm = xmdf;
        let t2 = t * t;
        let mut nodem = nodedf + self.nodecf * t2;
        let mut tempa = 1.0 - self.cc1 * t;
        let mut tempe = self.bstar * self.cc4 * t;
        let mut templ = self.t2cof * t2;

        if !self.isimp {
            let delomg = self.omgcof * t;
            let delm = self.xmcof * ((1.0 + self.eta * xmdf.cos()).powi(3) - self.delmo);
            let temp = delomg + delm;
            mm = xmdf + temp;
            argpm = argpdf - temp;
            let t3 = t2 * t;
            let t4 = t3 * t;
            tempa -= self.d2 * t2 + self.d3 * t3 + self.d4 * t4;
            tempe += self.bstar * self.cc5 * (mm.sin() - self.sinmao);
            templ += self.t3cof * t3 + t4 * (self.t4cof + t * self.t5cof);
        }

        let nm = self.no;
        if nm <= 0.0 {
            return Err(Error::diverged(format!("mean motion {nm} is not positive"), t));
        }
        let am = (xke / nm).powf(X2O3) * tempa * tempa;
        let nm = xke / am.powf(1.5);
        let mut em = self.ecco - tempe;
        if !am.is_finite() || am <= 0.0 {
            return Err(Error::diverged("semi-major axis collapsed", t));
        }
        if !(-0.001..1.0).contains(&em) {
            return Err(Error::diverged(
                format!("mean eccentricity {em:.6} outside [0, 1)"),
                t,
            ));
        }
        if em < 1.0e-6 {
            em = 1.0e-6;
        }

        mm += self.no * templ;
        let xlm = (mm + argpm + nodem) % TWO_PI;
        nodem %= TWO_PI;
        argpm %= TWO_PI;
        mm = (xlm - argpm - nodem) % TWO_PI;

        let sinip = self.inclo.sin();
        let cosip = self.inclo.cos();

        // Long period periodics
        let axnl = em * argpm.cos();
        let temp = 1.0 / (am * (1.0 - em * em));
        let aynl = em * argpm.sin() + temp * self.aycof;
        let xl = mm + argpm + nodem + temp * self.xlcof * axnl;

        // Kepler's equation in terms of the Lyddane variables
        let u = (xl - nodem) % TWO_PI;
        let mut eo1 = u;
        let mut tem5: f64 = 9999.9;
        let mut ktr = 1;
        while tem5.abs() >= 1.0e-12 && ktr <= 10 {
            let (sineo1, coseo1) = eo1.sin_cos();
            tem5 = 1.0 - coseo1 * axnl - sineo1 * aynl;
            tem5 = (u - aynl * coseo1 + axnl * sineo1 - eo1) / tem5;
            if tem5.abs() >= 0.95 {
                tem5 = 0.95_f64.copysign(tem5);
            }
            eo1 += tem5;
            ktr += 1;
        }

        // Short period preliminary quantities
        let (sineo1, coseo1) = eo1.sin_cos();
        let ecose = axnl * coseo1 + aynl * sineo1;
        let esine = axnl * sineo1 - aynl * coseo1;
        let el2 = axnl * axnl + aynl * aynl;
        let pl = am * (1.0 - el2);
        if pl < 0.0 {
            return Err(Error::diverged("semi-latus rectum is negative", t));
        }

        let rl = am * (1.0 - ecose);
        let rdotl = am.sqrt() * esine / rl;
        let rvdotl = pl.sqrt() / rl;
        let betal = (1.0 - el2).sqrt();
        let temp = esine / (1.0 + betal);
        let sinu = am / rl * (sineo1 - aynl - axnl * temp);
        let cosu = am / rl * (coseo1 - axnl + aynl * temp);
        let mut su = sinu.atan2(cosu);
        let sin2u = (cosu + cosu) * sinu;
        let cos2u = 1.0 - 2.0 * sinu * sinu;
        let temp = 1.0 / pl;
        let temp1 = 0.5 * WGS72_J2 * temp;
        let temp2 = temp1 * temp;

        // Short period periodics
        let mrt = rl * (1.0 - 1.5 * temp2 * betal * self.con41)
            + 0.5 * temp1 * self.x1mth2 * cos2u;
        su -= 0.25 * temp2 * self.x7thm1 * sin2u;
        let xnode = nodem + 1.5 * temp2 * cosip * sin2u;
        let xinc = self.inclo + 1.5 * temp2 * cosip * sinip * cos2u;
        let mvt = rdotl - nm * temp1 * self.x1mth2 * sin2u / xke;
        let rvdot = rvdotl + nm * temp1 * (self.x1mth2 * cos2u + 1.5 * self.con41) / xke;

        // Orientation vectors
        let (sinsu, cossu) = su.sin_cos();
        let (snod, cnod) = xnode.sin_cos();
        let (sini, cosi) = xinc.sin_cos();
        let xmx = -snod * cosi;
        let xmy = cnod * cosi;
        let u_vec = na::Vector3::new(xmx * sinsu + cnod * cossu, xmy * sinsu + snod * cossu, sini * sinsu);
        let v_vec = na::Vector3::new(xmx * cossu - cnod * sinsu, xmy * cossu - snod * sinsu, sini * cossu);

        if mrt < 1.0 {
            return Err(Error::diverged(
                format!("satellite has decayed (radius {:.1} km)", mrt * WGS72_RE),
                t,
            ));
        }

        let vkmpersec = WGS72_RE * xke / 60.0;
        let position = u_vec * (mrt * WGS72_RE);
        let velocity = (u_vec * mvt + v_vec * rvdot) * vkmpersec;
        Ok((position, velocity))
    }
}
